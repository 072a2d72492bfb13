//! HKDF, PBKDF2 and scrypt.

use hmac::digest::core_api::BlockSizeUser;
use hkdf::SimpleHkdf;
use sha2::Digest;
use veil_core::{Blob, CryptoError, CryptoResult, DigestAlg, HkdfMode};
use zeroize::Zeroizing;

use super::digest::with_digest;
use crate::kdf::{HkdfParams, KdfParamsSpec, Pbkdf2Params, ScryptParams};
use crate::spi::KdfSpi;

fn wrong_params(expected: &str) -> CryptoError {
    CryptoError::InvalidParams(format!("{expected} needs {expected} parameters"))
}

fn output_buffer(len: usize) -> CryptoResult<Zeroizing<Vec<u8>>> {
    if len == 0 {
        return Err(CryptoError::InvalidParams("output length must be positive".into()));
    }
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| CryptoError::AllocationFailure { requested: len })?;
    out.resize(len, 0);
    Ok(Zeroizing::new(out))
}

fn finish(mut out: Zeroizing<Vec<u8>>) -> Blob {
    Blob::from(std::mem::take(&mut *out))
}

pub(crate) struct HkdfBackend {
    md: DigestAlg,
    mode: HkdfMode,
}

impl HkdfBackend {
    pub(crate) fn new(md: DigestAlg, mode: HkdfMode) -> Self {
        Self { md, mode }
    }
}

fn hkdf_derive<D>(mode: HkdfMode, params: &HkdfParams) -> CryptoResult<Blob>
where
    D: Digest + BlockSizeUser + Clone,
{
    let hash_len = <D as Digest>::output_size();
    let mut okm = output_buffer(params.output_len)?;
    match mode {
        HkdfMode::ExtractAndExpand => {
            SimpleHkdf::<D>::new(Some(params.salt.as_slice()), &params.key)
                .expand(&params.info, &mut okm)
                .map_err(|_| too_long(params.output_len, hash_len))?;
        },
        HkdfMode::ExtractOnly => {
            if params.output_len != hash_len {
                return Err(CryptoError::InvalidParams(format!(
                    "extract-only output is the {hash_len}-byte PRK"
                )));
            }
            let (prk, _) = SimpleHkdf::<D>::extract(Some(params.salt.as_slice()), &params.key);
            okm.copy_from_slice(&prk);
        },
        HkdfMode::ExpandOnly => {
            SimpleHkdf::<D>::from_prk(&params.key)
                .map_err(|_| {
                    CryptoError::InvalidParams(format!("PRK must be at least {hash_len} bytes"))
                })?
                .expand(&params.info, &mut okm)
                .map_err(|_| too_long(params.output_len, hash_len))?;
        },
    }
    Ok(finish(okm))
}

fn too_long(len: usize, hash_len: usize) -> CryptoError {
    CryptoError::InvalidParams(format!(
        "HKDF output of {len} bytes exceeds 255 * {hash_len}"
    ))
}

impl KdfSpi for HkdfBackend {
    fn derive(&mut self, params: &KdfParamsSpec) -> CryptoResult<Blob> {
        let KdfParamsSpec::Hkdf(params) = params else {
            return Err(wrong_params("HKDF"));
        };
        with_digest!(self.md, D => hkdf_derive::<D>(self.mode, params))
    }
}

pub(crate) struct Pbkdf2Backend {
    md: DigestAlg,
}

impl Pbkdf2Backend {
    pub(crate) fn new(md: DigestAlg) -> Self {
        Self { md }
    }
}

fn pbkdf2_derive(md: DigestAlg, params: &Pbkdf2Params) -> CryptoResult<Blob> {
    if params.iterations == 0 {
        return Err(CryptoError::InvalidParams("PBKDF2 iterations must be positive".into()));
    }
    let mut out = output_buffer(params.output_len)?;
    with_digest!(md, D => pbkdf2::pbkdf2_hmac::<D>(
        &params.password,
        &params.salt,
        params.iterations,
        &mut out,
    ));
    Ok(finish(out))
}

impl KdfSpi for Pbkdf2Backend {
    fn derive(&mut self, params: &KdfParamsSpec) -> CryptoResult<Blob> {
        let KdfParamsSpec::Pbkdf2(params) = params else {
            return Err(wrong_params("PBKDF2"));
        };
        pbkdf2_derive(self.md, params)
    }
}

pub(crate) struct ScryptBackend;

/// Bytes scrypt's working set occupies for cost `n` and block size `r`.
fn scrypt_memory(n: u64, r: u32) -> Option<u64> {
    128u64.checked_mul(u64::from(r))?.checked_mul(n)
}

fn scrypt_derive(params: &ScryptParams) -> CryptoResult<Blob> {
    if params.n < 2 || !params.n.is_power_of_two() {
        return Err(CryptoError::InvalidParams(format!(
            "scrypt n = {} is not a power of two above 1",
            params.n
        )));
    }
    let memory = scrypt_memory(params.n, params.r)
        .filter(|bytes| *bytes <= params.max_mem)
        .ok_or_else(|| {
            CryptoError::InvalidParams(format!(
                "scrypt needs more than the {}-byte memory limit",
                params.max_mem
            ))
        })?;
    let log_n = u8::try_from(params.n.trailing_zeros()).map_err(CryptoError::backend)?;
    let cost = scrypt::Params::new(log_n, params.r, params.p, scrypt::Params::RECOMMENDED_LEN)
        .map_err(|e| CryptoError::InvalidParams(format!("scrypt parameters rejected: {e}")))?;

    let mut out = output_buffer(params.output_len)?;
    scrypt::scrypt(&params.passphrase, &params.salt, &cost, &mut out)
        .map_err(|e| CryptoError::InvalidParams(format!("scrypt output rejected: {e}")))?;
    tracing::trace!(log_n, memory, "scrypt derived");
    Ok(finish(out))
}

impl KdfSpi for ScryptBackend {
    fn derive(&mut self, params: &KdfParamsSpec) -> CryptoResult<Blob> {
        let KdfParamsSpec::Scrypt(params) = params else {
            return Err(wrong_params("SCRYPT"));
        };
        scrypt_derive(params)
    }
}

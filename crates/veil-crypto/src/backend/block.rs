//! Block cipher backend: AES, 3DES and DES in ECB and CBC, AES in CTR and
//! GCM.
//!
//! ECB, CBC and GCM buffer input and emit everything from `do_final`. CTR is
//! a stream and returns output from every `update`.

use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit as AeadKeyInit, Nonce, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use cipher::block_padding::{NoPadding, Pkcs7};
use cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit, StreamCipher};
use des::{Des, TdesEde3};
use veil_core::{Blob, CipherMode, CryptoError, CryptoResult, KeySize};
use zeroize::Zeroizing;

use crate::cipher::{CryptoMode, GcmParamsSpec, ParamsSpec};
use crate::spi::{CipherKeyRef, CipherSpi};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// GCM nonce length accepted.
const GCM_IV_LEN: usize = 12;
/// GCM tag length produced and accepted.
pub(crate) const GCM_TAG_LEN: usize = 16;

/// Run `$body` with `$c` bound to the block cipher type for `$alg`.
macro_rules! with_block_cipher {
    ($alg:expr, $c:ident => $body:expr) => {
        match $alg {
            BlockAlg::Aes128 => {
                type $c = Aes128;
                $body
            },
            BlockAlg::Aes192 => {
                type $c = Aes192;
                $body
            },
            BlockAlg::Aes256 => {
                type $c = Aes256;
                $body
            },
            BlockAlg::TripleDes => {
                type $c = TdesEde3;
                $body
            },
            BlockAlg::Des => {
                type $c = Des;
                $body
            },
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockAlg {
    Aes128,
    Aes192,
    Aes256,
    TripleDes,
    Des,
}

impl BlockAlg {
    pub(crate) fn from_key_size(size: KeySize) -> Option<Self> {
        match size {
            KeySize::Aes(128) => Some(Self::Aes128),
            KeySize::Aes(192) => Some(Self::Aes192),
            KeySize::Aes(256) => Some(Self::Aes256),
            KeySize::TripleDes => Some(Self::TripleDes),
            KeySize::Des => Some(Self::Des),
            _ => None,
        }
    }

    pub(crate) fn key_len(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 | Self::TripleDes => 24,
            Self::Aes256 => 32,
            Self::Des => 8,
        }
    }

    pub(crate) fn block_len(self) -> usize {
        match self {
            Self::Aes128 | Self::Aes192 | Self::Aes256 => 16,
            Self::TripleDes | Self::Des => 8,
        }
    }

    fn is_aes(self) -> bool {
        matches!(self, Self::Aes128 | Self::Aes192 | Self::Aes256)
    }

    /// Whether this backend implements `mode` for the algorithm.
    pub(crate) fn supports(self, mode: CipherMode) -> bool {
        match mode {
            CipherMode::Ecb | CipherMode::Cbc => true,
            CipherMode::Ctr | CipherMode::Gcm => self.is_aes(),
            CipherMode::Ofb
            | CipherMode::Cfb
            | CipherMode::Cfb1
            | CipherMode::Cfb8
            | CipherMode::Cfb64
            | CipherMode::Cfb128
            | CipherMode::Ccm => false,
        }
    }
}

enum CtrState {
    Aes128(ctr::Ctr128BE<Aes128>),
    Aes192(ctr::Ctr128BE<Aes192>),
    Aes256(ctr::Ctr128BE<Aes256>),
}

impl CtrState {
    fn new(alg: BlockAlg, key: &[u8], iv: &[u8]) -> CryptoResult<Self> {
        let state = match alg {
            BlockAlg::Aes128 => Self::Aes128(ctr::Ctr128BE::new_from_slices(key, iv).map_err(bad_key)?),
            BlockAlg::Aes192 => Self::Aes192(ctr::Ctr128BE::new_from_slices(key, iv).map_err(bad_key)?),
            BlockAlg::Aes256 => Self::Aes256(ctr::Ctr128BE::new_from_slices(key, iv).map_err(bad_key)?),
            BlockAlg::TripleDes | BlockAlg::Des => {
                return Err(CryptoError::NotSupported(format!("{alg:?} in CTR mode")));
            },
        };
        Ok(state)
    }

    fn apply(&mut self, buf: &mut [u8]) {
        match self {
            Self::Aes128(c) => c.apply_keystream(buf),
            Self::Aes192(c) => c.apply_keystream(buf),
            Self::Aes256(c) => c.apply_keystream(buf),
        }
    }
}

enum Active {
    Buffered {
        direction: CryptoMode,
        key: Zeroizing<Vec<u8>>,
        iv: Vec<u8>,
        buffer: Zeroizing<Vec<u8>>,
    },
    Ctr(CtrState),
    Gcm {
        direction: CryptoMode,
        key: Zeroizing<Vec<u8>>,
        params: GcmParamsSpec,
        buffer: Zeroizing<Vec<u8>>,
    },
}

pub(crate) struct BlockCipherBackend {
    alg: BlockAlg,
    mode: CipherMode,
    padded: bool,
    active: Option<Active>,
}

impl BlockCipherBackend {
    pub(crate) fn new(alg: BlockAlg, mode: CipherMode, padded: bool) -> CryptoResult<Self> {
        if !alg.supports(mode) {
            return Err(CryptoError::NotSupported(format!(
                "{alg:?} in {} mode",
                mode.name()
            )));
        }
        Ok(Self {
            alg,
            mode,
            padded,
            active: None,
        })
    }

    fn iv_for(&self, params: Option<&ParamsSpec>) -> CryptoResult<Vec<u8>> {
        if !self.mode.needs_iv() {
            return Ok(Vec::new());
        }
        let iv = match params {
            Some(ParamsSpec::Iv(spec)) => &spec.iv,
            Some(ParamsSpec::Gcm(_)) => {
                return Err(CryptoError::InvalidParams(
                    "GCM parameters given to a non-GCM mode".into(),
                ));
            },
            None => {
                return Err(CryptoError::InvalidParams(format!(
                    "{} mode needs an IV",
                    self.mode.name()
                )));
            },
        };
        if iv.len() != self.alg.block_len() {
            return Err(CryptoError::InvalidParams(format!(
                "IV must be {} bytes, got {}",
                self.alg.block_len(),
                iv.len()
            )));
        }
        Ok(iv.clone())
    }

    fn finish(&self, active: Active, input: &[u8]) -> CryptoResult<Vec<u8>> {
        match active {
            Active::Buffered {
                direction,
                key,
                iv,
                mut buffer,
            } => {
                buffer.extend_from_slice(input);
                if !self.padded && buffer.len() % self.alg.block_len() != 0 {
                    return Err(CryptoError::OperationFailed(format!(
                        "NoPadding input of {} bytes is not a multiple of the block size",
                        buffer.len()
                    )));
                }
                match self.mode {
                    CipherMode::Ecb => {
                        with_block_cipher!(self.alg, C => ecb_process::<C>(direction, &key, self.padded, &buffer))
                    },
                    _ => {
                        with_block_cipher!(self.alg, C => cbc_process::<C>(direction, &key, &iv, self.padded, &buffer))
                    },
                }
            },
            Active::Ctr(mut state) => {
                let mut out = input.to_vec();
                state.apply(&mut out);
                Ok(out)
            },
            Active::Gcm {
                direction,
                key,
                params,
                mut buffer,
            } => {
                buffer.extend_from_slice(input);
                match self.alg {
                    BlockAlg::Aes128 => gcm_process::<Aes128Gcm>(direction, &key, &params, &buffer),
                    BlockAlg::Aes192 => gcm_process::<Aes192Gcm>(direction, &key, &params, &buffer),
                    BlockAlg::Aes256 => gcm_process::<Aes256Gcm>(direction, &key, &params, &buffer),
                    BlockAlg::TripleDes | BlockAlg::Des => Err(CryptoError::NotSupported(
                        format!("{:?} in GCM mode", self.alg),
                    )),
                }
            },
        }
    }
}

impl CipherSpi for BlockCipherBackend {
    fn init(
        &mut self,
        mode: CryptoMode,
        key: CipherKeyRef<'_>,
        params: Option<&ParamsSpec>,
    ) -> CryptoResult<()> {
        let CipherKeyRef::Symmetric(key) = key else {
            return Err(CryptoError::InvalidParams(
                "block ciphers take a symmetric key".into(),
            ));
        };
        if key.len() != self.alg.key_len() {
            return Err(CryptoError::InvalidParams(format!(
                "{:?} key must be {} bytes, got {}",
                self.alg,
                self.alg.key_len(),
                key.len()
            )));
        }

        let active = match self.mode {
            CipherMode::Gcm => {
                let Some(ParamsSpec::Gcm(spec)) = params else {
                    return Err(CryptoError::InvalidParams("GCM needs GcmParamsSpec".into()));
                };
                if spec.iv.len() != GCM_IV_LEN {
                    return Err(CryptoError::InvalidParams(format!(
                        "GCM IV must be {GCM_IV_LEN} bytes"
                    )));
                }
                if mode == CryptoMode::Decrypt && spec.auth_tag.len() != GCM_TAG_LEN {
                    return Err(CryptoError::InvalidParams(format!(
                        "GCM tag must be {GCM_TAG_LEN} bytes"
                    )));
                }
                Active::Gcm {
                    direction: mode,
                    key: Zeroizing::new(key.to_vec()),
                    params: spec.clone(),
                    buffer: Zeroizing::new(Vec::new()),
                }
            },
            CipherMode::Ctr => {
                let iv = self.iv_for(params)?;
                Active::Ctr(CtrState::new(self.alg, key, &iv)?)
            },
            _ => Active::Buffered {
                direction: mode,
                key: Zeroizing::new(key.to_vec()),
                iv: self.iv_for(params)?,
                buffer: Zeroizing::new(Vec::new()),
            },
        };
        self.active = Some(active);
        Ok(())
    }

    fn update(&mut self, input: &[u8]) -> CryptoResult<Blob> {
        match self.active.as_mut() {
            None => Err(CryptoError::InvalidParams("cipher is not initialized".into())),
            Some(Active::Ctr(state)) => {
                let mut out = Blob::copy_from(input)?.into_vec();
                state.apply(&mut out);
                Ok(Blob::from(out))
            },
            Some(Active::Buffered { buffer, .. } | Active::Gcm { buffer, .. }) => {
                buffer.try_reserve(input.len())?;
                buffer.extend_from_slice(input);
                Ok(Blob::new())
            },
        }
    }

    fn do_final(&mut self, input: &[u8]) -> CryptoResult<Blob> {
        let active = self
            .active
            .take()
            .ok_or_else(|| CryptoError::InvalidParams("cipher is not initialized".into()))?;
        self.finish(active, input).map(Blob::from)
    }
}

fn bad_key(err: impl std::fmt::Display) -> CryptoError {
    CryptoError::InvalidParams(format!("key or IV rejected: {err}"))
}

fn bad_padding<E>(_: E) -> CryptoError {
    CryptoError::OperationFailed("decryption failed: bad padding or length".into())
}

fn ecb_process<C>(direction: CryptoMode, key: &[u8], padded: bool, data: &[u8]) -> CryptoResult<Vec<u8>>
where
    C: BlockCipher + BlockEncryptMut + BlockDecryptMut + KeyInit,
{
    match direction {
        CryptoMode::Encrypt => {
            let enc = ecb::Encryptor::<C>::new_from_slice(key).map_err(bad_key)?;
            Ok(if padded {
                enc.encrypt_padded_vec_mut::<Pkcs7>(data)
            } else {
                enc.encrypt_padded_vec_mut::<NoPadding>(data)
            })
        },
        CryptoMode::Decrypt => {
            let dec = ecb::Decryptor::<C>::new_from_slice(key).map_err(bad_key)?;
            if padded {
                dec.decrypt_padded_vec_mut::<Pkcs7>(data).map_err(bad_padding)
            } else {
                dec.decrypt_padded_vec_mut::<NoPadding>(data).map_err(bad_padding)
            }
        },
    }
}

fn cbc_process<C>(
    direction: CryptoMode,
    key: &[u8],
    iv: &[u8],
    padded: bool,
    data: &[u8],
) -> CryptoResult<Vec<u8>>
where
    C: BlockCipher + BlockEncryptMut + BlockDecryptMut + KeyInit,
{
    match direction {
        CryptoMode::Encrypt => {
            let enc = cbc::Encryptor::<C>::new_from_slices(key, iv).map_err(bad_key)?;
            Ok(if padded {
                enc.encrypt_padded_vec_mut::<Pkcs7>(data)
            } else {
                enc.encrypt_padded_vec_mut::<NoPadding>(data)
            })
        },
        CryptoMode::Decrypt => {
            let dec = cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(bad_key)?;
            if padded {
                dec.decrypt_padded_vec_mut::<Pkcs7>(data).map_err(bad_padding)
            } else {
                dec.decrypt_padded_vec_mut::<NoPadding>(data).map_err(bad_padding)
            }
        },
    }
}

fn gcm_process<A>(
    direction: CryptoMode,
    key: &[u8],
    params: &GcmParamsSpec,
    data: &[u8],
) -> CryptoResult<Vec<u8>>
where
    A: Aead + AeadKeyInit,
{
    let aead = <A as AeadKeyInit>::new_from_slice(key).map_err(bad_key)?;
    let nonce = Nonce::<A>::from_slice(&params.iv);
    match direction {
        CryptoMode::Encrypt => aead
            .encrypt(
                nonce,
                Payload {
                    msg: data,
                    aad: &params.aad,
                },
            )
            .map_err(|_| CryptoError::OperationFailed("GCM encryption failed".into())),
        CryptoMode::Decrypt => {
            let mut sealed = Vec::new();
            sealed.try_reserve_exact(data.len().saturating_add(GCM_TAG_LEN))?;
            sealed.extend_from_slice(data);
            sealed.extend_from_slice(&params.auth_tag);
            aead.decrypt(
                nonce,
                Payload {
                    msg: &sealed,
                    aad: &params.aad,
                },
            )
            .map_err(|_| CryptoError::OperationFailed("GCM authentication failed".into()))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::IvParamsSpec;

    fn run(
        backend: &mut BlockCipherBackend,
        mode: CryptoMode,
        key: &[u8],
        params: Option<&ParamsSpec>,
        data: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        backend.init(mode, CipherKeyRef::Symmetric(key), params)?;
        let mut out = backend.update(data)?.into_vec();
        out.extend_from_slice(&backend.do_final(&[])?);
        Ok(out)
    }

    #[test]
    fn test_ecb_nist_vector() {
        // SP 800-38A F.1.1, first block.
        let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let pt = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();
        let mut backend = BlockCipherBackend::new(BlockAlg::Aes128, CipherMode::Ecb, false).unwrap();
        let ct = run(&mut backend, CryptoMode::Encrypt, &key, None, &pt).unwrap();
        assert_eq!(hex::encode(ct), "3ad77bb40d7a3660a89ecaf32466ef97");
    }

    #[test]
    fn test_ctr_streams() {
        let key = [7u8; 16];
        let iv = ParamsSpec::Iv(IvParamsSpec { iv: vec![1u8; 16] });
        let mut backend = BlockCipherBackend::new(BlockAlg::Aes128, CipherMode::Ctr, false).unwrap();
        backend
            .init(CryptoMode::Encrypt, CipherKeyRef::Symmetric(&key), Some(&iv))
            .unwrap();
        assert_eq!(backend.update(b"hello").unwrap().len(), 5);
        assert_eq!(backend.do_final(b" world").unwrap().len(), 6);
    }

    #[test]
    fn test_unaligned_no_padding_fails() {
        let mut backend = BlockCipherBackend::new(BlockAlg::TripleDes, CipherMode::Ecb, false).unwrap();
        let err = run(&mut backend, CryptoMode::Encrypt, &[3u8; 24], None, b"short").unwrap_err();
        assert!(matches!(err, CryptoError::OperationFailed(_)));
    }

    #[test]
    fn test_unsupported_modes() {
        assert!(matches!(
            BlockCipherBackend::new(BlockAlg::Aes128, CipherMode::Ofb, true),
            Err(CryptoError::NotSupported(_))
        ));
        assert!(matches!(
            BlockCipherBackend::new(BlockAlg::TripleDes, CipherMode::Gcm, false),
            Err(CryptoError::NotSupported(_))
        ));
    }

    #[test]
    fn test_cbc_wrong_iv_length() {
        let mut backend = BlockCipherBackend::new(BlockAlg::Aes256, CipherMode::Cbc, true).unwrap();
        let iv = ParamsSpec::Iv(IvParamsSpec { iv: vec![0u8; 8] });
        let err = backend
            .init(CryptoMode::Encrypt, CipherKeyRef::Symmetric(&[0u8; 32]), Some(&iv))
            .unwrap_err();
        assert!(matches!(err, CryptoError::InvalidParams(_)));
    }
}

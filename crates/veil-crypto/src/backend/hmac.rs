//! HMAC backend.

use std::marker::PhantomData;

use hmac::digest::core_api::BlockSizeUser;
use hmac::{Mac, SimpleHmac};
use sha2::Digest;
use veil_core::{Blob, CryptoError, CryptoResult, DigestAlg};

use super::digest::with_digest;
use crate::spi::MacSpi;

pub(crate) struct HmacBackend<D>
where
    D: Digest + BlockSizeUser,
{
    mac: Option<SimpleHmac<D>>,
    _digest: PhantomData<fn() -> D>,
}

impl<D> HmacBackend<D>
where
    D: Digest + BlockSizeUser,
{
    fn new() -> Self {
        Self {
            mac: None,
            _digest: PhantomData,
        }
    }

    fn keyed(&mut self) -> CryptoResult<&mut SimpleHmac<D>> {
        self.mac
            .as_mut()
            .ok_or_else(|| CryptoError::InvalidParams("HMAC has no key".into()))
    }
}

impl<D> MacSpi for HmacBackend<D>
where
    D: Digest + BlockSizeUser + Send + 'static,
{
    fn init(&mut self, key: &[u8]) -> CryptoResult<()> {
        let mac = <SimpleHmac<D> as Mac>::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidParams(format!("HMAC key rejected: {e}")))?;
        self.mac = Some(mac);
        Ok(())
    }

    fn update(&mut self, data: &[u8]) -> CryptoResult<()> {
        self.keyed()?.update(data);
        Ok(())
    }

    fn finalize(&mut self) -> CryptoResult<Blob> {
        let mac = self
            .mac
            .take()
            .ok_or_else(|| CryptoError::InvalidParams("HMAC has no key".into()))?;
        Ok(Blob::from(mac.finalize().into_bytes().to_vec()))
    }

    fn output_len(&self) -> usize {
        <D as Digest>::output_size()
    }
}

/// Build the HMAC backend for `alg`.
pub(crate) fn hmac_backend(alg: DigestAlg) -> Box<dyn MacSpi> {
    with_digest!(alg, D => Box::new(HmacBackend::<D>::new()))
}

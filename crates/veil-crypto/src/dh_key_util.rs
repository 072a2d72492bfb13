//! Named DH domains as key parameter specs.

use tracing::debug;
use veil_core::spec::DhCommon;
use veil_core::{AsyKeySpec, BigInteger, CryptoError, CryptoResult, DhGroup, KeyParamSpec};

use crate::backend::dh::group_prime;

/// Builds DH common parameters for a prime size.
pub struct DhKeyUtil;

impl DhKeyUtil {
    /// Common parameters of the named group with a `p_len_bits` prime and a
    /// private value of `sk_len_bits` bits (0 for the full range below `p`).
    ///
    /// 2048, 3072 and 4096 bits select the RFC 7919 ffdhe groups; 1536, 6144
    /// and 8192 bits select the RFC 3526 MODP groups.
    ///
    /// ```
    /// use veil_crypto::prelude::*;
    ///
    /// let common = DhKeyUtil::create(2048, 0).unwrap();
    /// assert_eq!(common.p.bits(), 2048);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidParams`] for a prime size without a named
    /// group or a private length not below `p_len_bits`.
    pub fn create(p_len_bits: u32, sk_len_bits: u32) -> CryptoResult<DhCommon> {
        let group = match p_len_bits {
            1536 => DhGroup::Modp1536,
            2048 => DhGroup::Ffdhe2048,
            3072 => DhGroup::Ffdhe3072,
            4096 => DhGroup::Ffdhe4096,
            6144 => DhGroup::Modp6144,
            8192 => DhGroup::Modp8192,
            other => {
                return Err(CryptoError::InvalidParams(format!(
                    "no named DH group has a {other}-bit prime"
                )));
            },
        };
        let common = DhCommon {
            p: BigInteger::from(group_prime(group).to_bytes_be()),
            g: BigInteger::from(vec![2]),
            length: sk_len_bits,
        };
        KeyParamSpec::Dh(AsyKeySpec::common(common.clone())).validate()?;
        debug!(p_len_bits, sk_len_bits, "built DH common parameters");
        Ok(common)
    }
}

#[cfg(test)]
mod tests {
    use veil_core::{AsyKeySpecItem, ErrorCode};

    use super::*;
    use crate::asy_key::AsyKeyGeneratorBySpec;
    use crate::key_agreement::KeyAgreement;

    #[test]
    fn test_sizes_map_to_groups() {
        for bits in [1536, 2048, 3072, 4096, 6144, 8192] {
            let common = DhKeyUtil::create(bits, 0).unwrap();
            assert_eq!(common.p.bits(), bits as usize);
            assert_eq!(common.g.as_bytes(), [2]);
        }
        let ffdhe = DhKeyUtil::create(2048, 0).unwrap();
        assert_eq!(&ffdhe.p.as_bytes()[8..12], [0xAD, 0xF8, 0x54, 0x58]);
    }

    #[test]
    fn test_bad_lengths_rejected() {
        let result = DhKeyUtil::create(1024, 0);
        assert_eq!(ErrorCode::of(&result).as_i32(), -10001);
        assert!(matches!(
            DhKeyUtil::create(2048, 2048),
            Err(CryptoError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_spec_keys_agree() {
        let common = DhKeyUtil::create(2048, 224).unwrap();
        let spec = KeyParamSpec::Dh(AsyKeySpec::common(common));
        let mut generator = AsyKeyGeneratorBySpec::create(&spec).unwrap();
        let alice = generator.generate_key_pair().unwrap();
        let bob = generator.generate_key_pair().unwrap();
        assert_eq!(
            alice
                .private_key()
                .unwrap()
                .get_asy_key_spec_big_integer(AsyKeySpecItem::DhSk)
                .unwrap()
                .bits(),
            224
        );

        let mut agreement = KeyAgreement::create("DH_ffdhe2048").unwrap();
        let ab = agreement
            .generate_secret(alice.private_key().unwrap(), bob.public_key().unwrap())
            .unwrap();
        let ba = agreement
            .generate_secret(bob.private_key().unwrap(), alice.public_key().unwrap())
            .unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 256);
    }
}

//! Text encoding of binary results.

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use veil_config::Encoding;

/// Encode `bytes` for printing.
pub(crate) fn encode(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Hex => hex::encode(bytes),
        Encoding::Base64 => STANDARD.encode(bytes),
    }
}

/// Decode text produced by [`encode`], ignoring surrounding whitespace.
pub(crate) fn decode(text: &str, encoding: Encoding) -> Result<Vec<u8>> {
    let text = text.trim();
    match encoding {
        Encoding::Hex => hex::decode(text).context("value is not valid hex"),
        Encoding::Base64 => STANDARD.decode(text).context("value is not valid base64"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!(encode(&[0xde, 0xad], Encoding::Hex), "dead");
        assert_eq!(decode(" DEAD\n", Encoding::Hex).unwrap(), vec![0xde, 0xad]);
    }

    #[test]
    fn test_base64() {
        assert_eq!(encode(b"veil", Encoding::Base64), "dmVpbA==");
        assert_eq!(decode("dmVpbA==", Encoding::Base64).unwrap(), b"veil");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("zz", Encoding::Hex).is_err());
        assert!(decode("***", Encoding::Base64).is_err());
    }
}

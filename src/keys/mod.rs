//! Key material: extended ed25519 keys, mnemonic recovery, encrypted exports

pub mod cipher;
pub mod recovery;
pub mod secret;

pub use secret::{PublicKey, SecretKey, Signature, EXTENDED_KEY_SIZE};

use crate::{Result, WalletError};

/// Split a blob of concatenated 64-byte records into keys
pub fn parse_key_records(bytes: &[u8]) -> Result<Vec<SecretKey>> {
    if bytes.len() % EXTENDED_KEY_SIZE != 0 {
        return Err(WalletError::malformed_key(format!(
            "{} bytes is not a multiple of {}",
            bytes.len(),
            EXTENDED_KEY_SIZE
        )));
    }

    bytes
        .chunks_exact(EXTENDED_KEY_SIZE)
        .map(SecretKey::from_bytes)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_records() {
        let a = SecretKey::from_seed(&[1u8; 32]);
        let b = SecretKey::from_seed(&[2u8; 32]);
        let mut blob = a.as_bytes().to_vec();
        blob.extend_from_slice(b.as_bytes());

        let keys = parse_key_records(&blob).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].public_key(), b.public_key());

        assert!(parse_key_records(&[]).unwrap().is_empty());
        assert!(matches!(
            parse_key_records(&blob[..100]),
            Err(WalletError::MalformedKey(_))
        ));
    }
}

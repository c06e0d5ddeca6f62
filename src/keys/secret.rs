//! Extended ed25519 signing keys
//!
//! Account and UTXO keys are 64-byte extended secret keys: a clamped
//! 32-byte scalar followed by a 32-byte nonce prefix.

use ed25519_dalek::hazmat::{raw_sign, ExpandedSecretKey};
use ed25519_dalek::{Verifier, VerifyingKey};
use sha2::{Digest, Sha512};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{Result, WalletError};

pub const EXTENDED_KEY_SIZE: usize = 64;
pub const PUBLIC_KEY_SIZE: usize = 32;
pub const SIGNATURE_SIZE: usize = 64;

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; EXTENDED_KEY_SIZE],
}

impl SecretKey {
    /// Parse a 64-byte extended key record
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; EXTENDED_KEY_SIZE] = bytes.try_into().map_err(|_| {
            WalletError::malformed_key(format!(
                "expected {} bytes, got {}",
                EXTENDED_KEY_SIZE,
                bytes.len()
            ))
        })?;

        if !is_clamped(&bytes) {
            return Err(WalletError::malformed_key("scalar is not clamped"));
        }

        Ok(Self { bytes })
    }

    /// Expand a 32-byte ed25519 seed the way RFC 8032 does
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let mut bytes = [0u8; EXTENDED_KEY_SIZE];
        bytes.copy_from_slice(&Sha512::digest(seed));
        bytes[0] &= 0b1111_1000;
        bytes[31] &= 0b0111_1111;
        bytes[31] |= 0b0100_0000;
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; EXTENDED_KEY_SIZE] {
        &self.bytes
    }

    pub fn public_key(&self) -> PublicKey {
        let esk = ExpandedSecretKey::from_bytes(&self.bytes);
        PublicKey(VerifyingKey::from(&esk).to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        let esk = ExpandedSecretKey::from_bytes(&self.bytes);
        let verifying_key = VerifyingKey::from(&esk);
        let signature = raw_sign::<Sha512>(&esk, message, &verifying_key);
        Signature(signature.to_bytes())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

fn is_clamped(bytes: &[u8; EXTENDED_KEY_SIZE]) -> bool {
    bytes[0] & 0b0000_0111 == 0 && bytes[31] & 0b1100_0000 == 0b0100_0000
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&self.0) else {
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(&signature.0);
        key.verify(message, &signature).is_ok()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_SIZE]);

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

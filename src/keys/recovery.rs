//! Mnemonic recovery
//!
//! BIP-39 phrase → seed, then SLIP-0010 hardened ed25519 derivation down to
//! the account key.

use bip39::Mnemonic;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroizing;

use super::secret::SecretKey;
use crate::{Result, WalletError};

type HmacSha512 = Hmac<Sha512>;

const HARDENED: u32 = 0x8000_0000;
const SLIP10_CURVE_KEY: &[u8] = b"ed25519 seed";

/// m/1852'/1815'/0'/2'/0'
pub const ACCOUNT_DERIVATION_PATH: [u32; 5] = [
    1852 | HARDENED,
    1815 | HARDENED,
    HARDENED,
    2 | HARDENED,
    HARDENED,
];

struct Node {
    key: Zeroizing<[u8; 32]>,
    chain_code: Zeroizing<[u8; 32]>,
}

impl Node {
    fn from_hmac(key: &[u8], parts: &[&[u8]]) -> Result<Self> {
        let mut mac = HmacSha512::new_from_slice(key)
            .map_err(|e| WalletError::malformed_key(format!("HMAC key: {}", e)))?;
        for part in parts {
            mac.update(part);
        }
        let mut output = Zeroizing::new([0u8; 64]);
        output.copy_from_slice(&mac.finalize().into_bytes());

        let mut node = Node {
            key: Zeroizing::new([0u8; 32]),
            chain_code: Zeroizing::new([0u8; 32]),
        };
        node.key.copy_from_slice(&output[..32]);
        node.chain_code.copy_from_slice(&output[32..]);
        Ok(node)
    }

    fn master(seed: &[u8]) -> Result<Self> {
        Self::from_hmac(SLIP10_CURVE_KEY, &[seed])
    }

    fn derive_hardened(&self, index: u32) -> Result<Self> {
        let index = (index | HARDENED).to_be_bytes();
        Self::from_hmac(&self.chain_code[..], &[&[0u8][..], &self.key[..], &index[..]])
    }
}

/// Validate a phrase (NFKD-normalized, word list and checksum checked)
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic> {
    Mnemonic::parse(phrase).map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

/// Derive the account key for `phrase` and an optional BIP-39 passphrase
pub fn derive_account_key(phrase: &str, passphrase: &str) -> Result<SecretKey> {
    let mnemonic = parse_mnemonic(phrase)?;
    let seed = Zeroizing::new(mnemonic.to_seed(passphrase));
    derive_path(&seed[..], &ACCOUNT_DERIVATION_PATH)
}

pub fn derive_path(seed: &[u8], path: &[u32]) -> Result<SecretKey> {
    let mut node = Node::master(seed)?;
    for index in path {
        node = node.derive_hardened(*index)?;
    }
    Ok(SecretKey::from_seed(&node.key))
}

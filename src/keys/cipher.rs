//! Password-protected key blobs
//!
//! Blob layout, protocol `0x02`:
//!
//! ```text
//! 0x02 | m_cost u32 | t_cost u32 | p_cost u8 | salt[16] | nonce[12] | ciphertext | tag[16]
//! ```
//!
//! Argon2id turns the password into a ChaCha20-Poly1305 key. Protocol `0x01`
//! is the older export format (`0x01 | salt | nonce | ciphertext | tag`, key
//! from PBKDF2-HMAC-SHA512); it is accepted for decryption only.
//!
//! Decryption failures all surface as [`WalletError::AuthenticationFailed`]
//! so a caller cannot tell a wrong password from a damaged blob.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::{CryptoRng, RngCore};
use sha2::Sha512;
use zeroize::Zeroizing;

use super::secret::EXTENDED_KEY_SIZE;
use crate::chain::codec::ByteReader;
use crate::config::{engine_config, KdfParams, MAX_KDF_ITERATIONS, MAX_KDF_PARALLELISM};
use crate::{Result, WalletError};

pub const PROTOCOL_PBKDF2: u8 = 0x01;
pub const PROTOCOL_ARGON2ID: u8 = 0x02;

const SALT_SIZE: usize = 16;
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const KEY_SIZE: usize = 32;

const PBKDF2_ROUNDS: u32 = 12_983;

enum Kdf {
    Pbkdf2,
    Argon2id(KdfParams),
}

impl Kdf {
    fn derive(&self, password: &[u8], salt: &[u8]) -> Option<Zeroizing<[u8; KEY_SIZE]>> {
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        match self {
            Kdf::Pbkdf2 => {
                pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, PBKDF2_ROUNDS, &mut key[..]);
            }
            Kdf::Argon2id(params) => {
                argon2_instance(params)
                    .ok()?
                    .hash_password_into(password, salt, &mut key[..])
                    .ok()?;
            }
        }
        Some(key)
    }
}

fn argon2_instance(params: &KdfParams) -> std::result::Result<Argon2<'static>, argon2::Error> {
    let params = Params::new(
        params.memory_kib,
        params.iterations,
        u32::from(params.parallelism),
        Some(KEY_SIZE),
    )?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Decrypt an exported key blob
///
/// On success the plaintext is a concatenation of 64-byte secret key
/// records: the account key followed by zero or more UTXO keys.
///
/// A header declaring more Argon2 memory than the configured ceiling is
/// refused before any key derivation runs.
pub fn decrypt(password: &[u8], blob: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    match try_decrypt(password, blob, engine_config().max_kdf_memory_kib) {
        Some(plaintext) => {
            log::debug!("Decrypted key blob: {} key records", plaintext.len() / EXTENDED_KEY_SIZE);
            Ok(plaintext)
        }
        None => {
            log::debug!("Key blob decryption failed");
            Err(WalletError::AuthenticationFailed)
        }
    }
}

fn try_decrypt(password: &[u8], blob: &[u8], max_memory_kib: u32) -> Option<Zeroizing<Vec<u8>>> {
    let mut reader = ByteReader::new(blob);

    let kdf = match reader.u8().ok()? {
        PROTOCOL_PBKDF2 => Kdf::Pbkdf2,
        PROTOCOL_ARGON2ID => {
            let params = KdfParams {
                memory_kib: reader.u32().ok()?,
                iterations: reader.u32().ok()?,
                parallelism: reader.u8().ok()?,
            };
            if params.memory_kib > max_memory_kib
                || params.iterations > MAX_KDF_ITERATIONS
                || params.parallelism > MAX_KDF_PARALLELISM
            {
                log::warn!(
                    "⚠️  Key blob asks for m={}KiB t={} p={}, above the allowed cost",
                    params.memory_kib,
                    params.iterations,
                    params.parallelism
                );
                return None;
            }
            Kdf::Argon2id(params)
        }
        _ => return None,
    };

    let salt = reader.take(SALT_SIZE).ok()?;
    let nonce = reader.take(NONCE_SIZE).ok()?;
    let sealed = reader.rest();

    let ciphertext_len = sealed.len().checked_sub(TAG_SIZE)?;
    if ciphertext_len == 0 || ciphertext_len % EXTENDED_KEY_SIZE != 0 {
        return None;
    }

    let key = kdf.derive(password, salt)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .ok()
        .map(Zeroizing::new)
}

/// Encrypt key records with the configured KDF cost
pub fn encrypt<R: RngCore + CryptoRng>(
    password: &[u8],
    plaintext: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>> {
    encrypt_with_params(password, plaintext, engine_config().kdf, rng)
}

pub fn encrypt_with_params<R: RngCore + CryptoRng>(
    password: &[u8],
    plaintext: &[u8],
    params: KdfParams,
    rng: &mut R,
) -> Result<Vec<u8>> {
    if plaintext.is_empty() || plaintext.len() % EXTENDED_KEY_SIZE != 0 {
        return Err(WalletError::malformed_key(format!(
            "payload of {} bytes is not a list of {}-byte keys",
            plaintext.len(),
            EXTENDED_KEY_SIZE
        )));
    }

    let mut salt = [0u8; SALT_SIZE];
    let mut nonce = [0u8; NONCE_SIZE];
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut nonce);

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    argon2_instance(&params)
        .and_then(|argon2| argon2.hash_password_into(password, &salt, &mut key[..]))
        .map_err(|e| WalletError::InvalidInput(format!("KDF parameters: {}", e)))?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| WalletError::InvalidInput("encryption failed".to_string()))?;

    let mut blob = Vec::with_capacity(1 + 9 + SALT_SIZE + NONCE_SIZE + sealed.len());
    blob.push(PROTOCOL_ARGON2ID);
    blob.extend_from_slice(&params.memory_kib.to_be_bytes());
    blob.extend_from_slice(&params.iterations.to_be_bytes());
    blob.push(params.parallelism);
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&sealed);

    log::debug!(
        "Encrypted {} key records (m={}KiB t={} p={})",
        plaintext.len() / EXTENDED_KEY_SIZE,
        params.memory_kib,
        params.iterations,
        params.parallelism
    );
    Ok(blob)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    const FAST: KdfParams = KdfParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    };

    fn legacy_blob(password: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let salt = [3u8; SALT_SIZE];
        let nonce = [4u8; NONCE_SIZE];
        let mut key = [0u8; KEY_SIZE];
        pbkdf2::pbkdf2_hmac::<Sha512>(password, &salt, PBKDF2_ROUNDS, &mut key);
        let sealed = ChaCha20Poly1305::new(Key::from_slice(&key))
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .unwrap();

        let mut blob = vec![PROTOCOL_PBKDF2];
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);
        blob
    }

    #[test]
    fn test_round_trip() {
        let plaintext = [0x5au8; 128];
        let blob = encrypt_with_params(b"secret", &plaintext, FAST, &mut OsRng).unwrap();

        assert_eq!(blob.len(), 1 + 9 + SALT_SIZE + NONCE_SIZE + 128 + TAG_SIZE);
        assert_eq!(&decrypt(b"secret", &blob).unwrap()[..], &plaintext[..]);
    }

    #[test]
    fn test_legacy_protocol_decrypts() {
        let plaintext = [0x11u8; 64];
        let blob = legacy_blob(b"1234", &plaintext);

        assert_eq!(&decrypt(b"1234", &blob).unwrap()[..], &plaintext[..]);
        assert_eq!(decrypt(b"4321", &blob), Err(WalletError::AuthenticationFailed));
    }

    #[test]
    fn test_every_failure_looks_the_same() {
        let blob = encrypt_with_params(b"secret", &[1u8; 64], FAST, &mut OsRng).unwrap();

        let mut tampered = blob.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;

        let mut unknown_protocol = blob.clone();
        unknown_protocol[0] = 0x07;

        let mut absurd_cost = blob.clone();
        absurd_cost[1..5].copy_from_slice(&u32::MAX.to_be_bytes());

        for candidate in [
            decrypt(b"wrong", &blob),
            decrypt(b"secret", &tampered),
            decrypt(b"secret", &blob[..blob.len() - 1]),
            decrypt(b"secret", &unknown_protocol),
            decrypt(b"secret", &absurd_cost),
            decrypt(b"secret", &[]),
        ] {
            assert_eq!(candidate, Err(WalletError::AuthenticationFailed));
        }
    }

    fn with_cost(blob: &[u8], memory_kib: u32, iterations: u32) -> Vec<u8> {
        let mut blob = blob.to_vec();
        blob[1..5].copy_from_slice(&memory_kib.to_be_bytes());
        blob[5..9].copy_from_slice(&iterations.to_be_bytes());
        blob
    }

    #[test]
    fn test_oversized_kdf_memory_is_rejected() {
        let blob = encrypt_with_params(b"secret", &[7u8; 64], FAST, &mut OsRng).unwrap();
        let ceiling = engine_config().max_kdf_memory_kib;

        // 1 GiB with four passes would take seconds if it reached Argon2
        let started = std::time::Instant::now();
        for candidate in [
            with_cost(&blob, 1 << 20, 4),
            with_cost(&blob, ceiling + 1, 1),
            with_cost(&blob, FAST.memory_kib, MAX_KDF_ITERATIONS + 1),
        ] {
            assert_eq!(decrypt(b"secret", &candidate), Err(WalletError::AuthenticationFailed));
        }
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_memory_ceiling_is_inclusive() {
        let blob = encrypt_with_params(b"secret", &[7u8; 64], FAST, &mut OsRng).unwrap();

        assert!(try_decrypt(b"secret", &blob, FAST.memory_kib).is_some());
        assert!(try_decrypt(b"secret", &blob, FAST.memory_kib - 1).is_none());
    }

    #[test]
    fn test_encrypt_rejects_partial_records() {
        assert!(matches!(
            encrypt_with_params(b"pw", &[0u8; 65], FAST, &mut OsRng),
            Err(WalletError::MalformedKey(_))
        ));
        assert!(matches!(
            encrypt_with_params(b"pw", &[], FAST, &mut OsRng),
            Err(WalletError::MalformedKey(_))
        ));
    }
}

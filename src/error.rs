//! Error types for wallet engine operations
//!
//! Every fallible engine call returns [`WalletError`]. Mutating wallet
//! operations either apply fully or fail with one of these variants,
//! leaving the wallet untouched.

use thiserror::Error;

/// Core error type for wallet engine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Mnemonic failed word-list or checksum validation
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Secret key record has the wrong length or is not a valid extended key
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    /// Genesis block could not be parsed or lacks required configuration
    #[error("Malformed block: {0}")]
    MalformedBlock(String),

    /// Wrong password or corrupted ciphertext; the two are never told apart
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Vote choice outside of the proposal's options
    #[error("Invalid choice {choice}: proposal has {num_choices} choices")]
    InvalidChoice { choice: u8, num_choices: u8 },

    /// Expiry date in the past, beyond the allowed horizon, or not a valid slot
    #[error("Expiry date out of range: {0}")]
    ExpiredOrOutOfRange(String),

    /// Unknown fragment id, or the wallet lacks the required key material
    #[error("Not found: {0}")]
    NotFound(String),

    /// Indexed access past the end of a conversion or pending snapshot
    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Account balance does not cover the transaction fee
    #[error("Not enough funds: needed {needed}, available {available}")]
    NotEnoughFunds { needed: u64, available: u64 },

    /// Serialized fragment could not be decoded
    #[error("Invalid fragment: {0}")]
    InvalidFragment(String),

    /// Election public key text could not be decoded
    #[error("Invalid vote encryption key: {0}")]
    InvalidVoteEncryptionKey(String),

    /// Explicit settings parameters are inconsistent
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Generic argument validation failure
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transaction could not be balanced or signed
    #[error("Transaction building failed: {0}")]
    TransactionBuilding(String),
}

// Helper functions for common error scenarios
impl WalletError {
    /// Create a malformed key error
    pub fn malformed_key(msg: impl Into<String>) -> Self {
        Self::MalformedKey(msg.into())
    }

    /// Create a malformed block error
    pub fn malformed_block(msg: impl Into<String>) -> Self {
        Self::MalformedBlock(msg.into())
    }

    /// Create an invalid fragment error
    pub fn invalid_fragment(msg: impl Into<String>) -> Self {
        Self::InvalidFragment(msg.into())
    }

    /// Create an expiry error
    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::ExpiredOrOutOfRange(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Stable numeric code handed across language boundaries by the
    /// platform shims. Codes never change once assigned.
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidMnemonic(_) => 1,
            Self::MalformedKey(_) => 2,
            Self::MalformedBlock(_) => 3,
            Self::AuthenticationFailed => 4,
            Self::InvalidChoice { .. } => 5,
            Self::ExpiredOrOutOfRange(_) => 6,
            Self::NotFound(_) => 7,
            Self::IndexOutOfRange { .. } => 8,
            Self::NotEnoughFunds { .. } => 9,
            Self::InvalidFragment(_) => 10,
            Self::InvalidVoteEncryptionKey(_) => 11,
            Self::InvalidSettings(_) => 12,
            Self::InvalidInput(_) => 13,
            Self::TransactionBuilding(_) => 14,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = vec![
            WalletError::InvalidMnemonic("x".into()),
            WalletError::malformed_key("x"),
            WalletError::malformed_block("x"),
            WalletError::AuthenticationFailed,
            WalletError::InvalidChoice { choice: 3, num_choices: 3 },
            WalletError::out_of_range("x"),
            WalletError::not_found("x"),
            WalletError::IndexOutOfRange { index: 1, len: 0 },
            WalletError::NotEnoughFunds { needed: 2, available: 1 },
            WalletError::invalid_fragment("x"),
            WalletError::InvalidVoteEncryptionKey("x".into()),
            WalletError::InvalidSettings("x".into()),
            WalletError::InvalidInput("x".into()),
            WalletError::TransactionBuilding("x".into()),
        ];

        let mut codes: Vec<u32> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len(), "Every variant needs its own code");
    }

    #[test]
    fn test_authentication_failure_message_is_opaque() {
        assert_eq!(WalletError::AuthenticationFailed.to_string(), "Authentication failed");
    }
}

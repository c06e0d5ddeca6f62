//! Wallet engine for an account/UTXO hybrid ledger
//!
//! Recovers keys, discovers funds in a genesis block, converts legacy UTXO
//! funds into the account, builds vote-cast transactions and tracks them
//! until the caller reports confirmation.
//!
//! # Architecture
//!
//! - **Keys**: mnemonic recovery, raw key import, encrypted key blobs
//! - **Chain**: addresses, transactions, fragments, blocks and their binary codec
//! - **Settings**: fee model and time era read from the genesis block
//! - **Wallet**: fund ledger, conversion, vote casting, pending tracking
//!
//! # Example
//!
//! ```ignore
//! use wallet_engine::{BlockDate, Proposal, VotePlanId, Wallet};
//!
//! wallet_engine::config::init();
//!
//! let mut wallet = Wallet::recover("neck bulb teach illegal soul cry monitor claw amount boring provide village rival draft stone")?;
//! let settings = wallet.initial_funds(&block0)?;
//!
//! let conversion = wallet.convert(&settings, BlockDate::new(1, 0))?;
//! for fragment in conversion.transactions() {
//!     submit(fragment)?;
//! }
//!
//! let proposal = Proposal::new_public(plan_id, 0, 3)?;
//! let vote = wallet.vote(&settings, &proposal, 1, BlockDate::new(1, 0))?;
//! let id = wallet_engine::Fragment::from_bytes(&vote)?.id()?;
//! // ... once the fragment is in a block
//! wallet.confirm_transaction(&id)?;
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod keys;
pub mod settings;
pub mod vote;
pub mod wallet;

pub use chain::{
    Address, BlockDate, Discrimination, Fragment, FragmentId, LinearFee, TimeEra, Value,
    VotePlanId,
};
pub use config::EngineConfig;
pub use error::WalletError;
pub use keys::{PublicKey, SecretKey};
pub use settings::{Settings, SettingsInit};
pub use vote::{ElectionPublicKey, Proposal};
pub use wallet::{Conversion, IgnoredInputs, PendingTransactions, UtxoEntry, Wallet};

pub type Result<T> = std::result::Result<T, WalletError>;

//! The wallet: keys, discovered funds, spending counter and pending set
//!
//! Mutating operations take `&mut self` and are all-or-nothing: on error the
//! wallet is left exactly as it was.

mod builder;
pub mod conversion;
pub mod funds;
pub mod pending;
mod vote_cast;

pub use conversion::{Conversion, IgnoredInputs};
pub use funds::{KeyOwner, UtxoEntry};
pub use pending::PendingTransactions;

use funds::{FundLedger, KeyIndex};
use pending::PendingSet;

use crate::chain::{Address, Block, Discrimination, Fragment, FragmentId, Value};
use crate::keys::{self, cipher, recovery, PublicKey, SecretKey};
use crate::settings::Settings;
use crate::{Result, WalletError};

#[derive(Debug)]
pub struct Wallet {
    account: Option<SecretKey>,
    utxo_keys: Vec<SecretKey>,
    spending_counter: u32,
    funds: FundLedger,
    pending: PendingSet,
}

impl Wallet {
    fn with_keys(account: Option<SecretKey>, utxo_keys: Vec<SecretKey>) -> Self {
        Self {
            account,
            utxo_keys,
            spending_counter: 0,
            funds: FundLedger::default(),
            pending: PendingSet::default(),
        }
    }

    /// Recover the account key from a BIP-39 mnemonic
    pub fn recover(mnemonic: &str) -> Result<Self> {
        Self::recover_with_passphrase(mnemonic, "")
    }

    pub fn recover_with_passphrase(mnemonic: &str, passphrase: &str) -> Result<Self> {
        let account = recovery::derive_account_key(mnemonic, passphrase)?;
        log::info!("🔑 Recovered wallet {}", account.public_key());
        Ok(Self::with_keys(Some(account), Vec::new()))
    }

    /// Import a 64-byte account key and concatenated 64-byte UTXO keys
    pub fn import_keys(account_key: &[u8], utxo_keys: &[u8]) -> Result<Self> {
        let account = SecretKey::from_bytes(account_key)?;
        let utxo_keys = keys::parse_key_records(utxo_keys)?;
        log::info!(
            "🔑 Imported wallet {} with {} UTXO keys",
            account.public_key(),
            utxo_keys.len()
        );
        Ok(Self::with_keys(Some(account), utxo_keys))
    }

    /// Wallet holding only UTXO keys; it can discover funds but not spend
    pub fn import_utxo_keys(utxo_keys: &[u8]) -> Result<Self> {
        let utxo_keys = keys::parse_key_records(utxo_keys)?;
        log::info!("🔑 Imported {} UTXO keys without an account", utxo_keys.len());
        Ok(Self::with_keys(None, utxo_keys))
    }

    /// Decrypt an exported key blob: the account key followed by UTXO keys
    pub fn from_encrypted(password: &[u8], blob: &[u8]) -> Result<Self> {
        let plaintext = cipher::decrypt(password, blob)?;
        let mut records = keys::parse_key_records(&plaintext)?.into_iter();
        let account = records
            .next()
            .ok_or_else(|| WalletError::malformed_key("encrypted blob holds no keys"))?;
        Ok(Self::with_keys(Some(account), records.collect()))
    }

    pub(crate) fn account_key(&self) -> Result<&SecretKey> {
        self.account
            .as_ref()
            .ok_or_else(|| WalletError::not_found("wallet has no account key"))
    }

    fn key_index(&self) -> KeyIndex {
        KeyIndex::new(
            self.account.as_ref().map(SecretKey::public_key),
            self.utxo_keys.iter().map(SecretKey::public_key).collect(),
        )
    }

    /// Account public key
    pub fn account_id(&self) -> Result<PublicKey> {
        Ok(self.account_key()?.public_key())
    }

    pub fn account_address(&self, discrimination: Discrimination) -> Result<Address> {
        Ok(Address::account(discrimination, self.account_id()?))
    }

    pub fn spending_counter(&self) -> u32 {
        self.spending_counter
    }

    pub fn account_balance(&self) -> Value {
        self.funds.account_balance()
    }

    pub fn utxos(&self) -> &[UtxoEntry] {
        self.funds.utxos()
    }

    /// Everything the wallet can spend: UTXO entries plus account balance
    pub fn total_value(&self) -> Value {
        self.funds.total_value()
    }

    /// Read settings from the genesis block and collect the funds it gives us
    pub fn initial_funds(&mut self, block0: &[u8]) -> Result<Settings> {
        let block = Block::from_bytes(block0)?;
        let settings = Settings::from_parsed_block(&block)?;

        let keys = self.key_index();
        let mut funds = self.funds.clone();
        let mut applied = 0usize;
        for (id, fragment) in block.fragments() {
            if let Some(tx) = fragment.transaction() {
                if funds.apply(*id, tx, &keys)? {
                    applied += 1;
                }
            }
        }
        self.funds = funds;

        log::info!(
            "💰 Scanned genesis {}: {} new transactions, total value {}",
            block.id(),
            applied,
            self.total_value()
        );
        Ok(settings)
    }

    /// Scan one observed fragment; `false` if it carried nothing new
    pub fn apply_fragment(&mut self, bytes: &[u8]) -> Result<bool> {
        let fragment = Fragment::from_bytes(bytes)?;
        let Some(tx) = fragment.transaction() else {
            return Ok(false);
        };
        let id = fragment.id()?;

        let mut funds = self.funds.clone();
        let changed = funds.apply(id, tx, &self.key_index())?;
        self.funds = funds;
        Ok(changed)
    }

    /// Overwrite the account balance and spending counter with chain state
    pub fn set_state(&mut self, balance: Value, counter: u32) -> Result<()> {
        self.account_key()?;
        log::info!(
            "Account state set: balance {} -> {}, counter {} -> {}",
            self.funds.account_balance(),
            balance,
            self.spending_counter,
            counter
        );
        self.funds.set_account_balance(balance);
        self.spending_counter = counter;
        Ok(())
    }

    pub fn pending_transactions(&self) -> PendingTransactions {
        self.pending.snapshot()
    }

    /// Mark a pending fragment as confirmed, `NotFound` if it is not pending
    pub fn confirm_transaction(&mut self, id: &FragmentId) -> Result<()> {
        if !self.pending.remove(id) {
            return Err(WalletError::not_found(format!("fragment {} is not pending", id)));
        }
        log::info!("✅ Confirmed {}", id);
        Ok(())
    }

    /// Whether a fragment id has already been applied or built
    pub fn is_known(&self, id: &FragmentId) -> bool {
        self.funds.is_processed(id)
    }
}

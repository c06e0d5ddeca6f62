//! Fund discovery
//!
//! Tracks the UTXO entries owned by the wallet's keys and the running
//! account balance, fed one transaction at a time. Each fragment id is
//! applied at most once.

use std::collections::HashSet;

use crate::chain::transaction::InputSource;
use crate::chain::{AddressKind, FragmentId, Transaction, Value};
use crate::keys::PublicKey;
use crate::{Result, WalletError};

/// Which of the wallet's keys can spend an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyOwner {
    Account,
    /// Position in the imported UTXO key list
    Legacy(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtxoEntry {
    pub fragment_id: FragmentId,
    pub output_index: u8,
    pub value: Value,
    pub owner: KeyOwner,
}

/// Public keys the ledger recognises as ours
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyIndex {
    account: Option<PublicKey>,
    legacy: Vec<PublicKey>,
}

impl KeyIndex {
    pub(crate) fn new(account: Option<PublicKey>, legacy: Vec<PublicKey>) -> Self {
        Self { account, legacy }
    }

    fn is_account(&self, key: &PublicKey) -> bool {
        self.account.as_ref() == Some(key)
    }

    fn owner_of(&self, key: &PublicKey) -> Option<KeyOwner> {
        if self.is_account(key) {
            return Some(KeyOwner::Account);
        }
        self.legacy
            .iter()
            .position(|k| k == key)
            .map(KeyOwner::Legacy)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FundLedger {
    utxos: Vec<UtxoEntry>,
    account_balance: Value,
    processed: HashSet<FragmentId>,
}

impl FundLedger {
    pub(crate) fn utxos(&self) -> &[UtxoEntry] {
        &self.utxos
    }

    pub(crate) fn account_balance(&self) -> Value {
        self.account_balance
    }

    pub(crate) fn set_account_balance(&mut self, balance: Value) {
        self.account_balance = balance;
    }

    pub(crate) fn is_processed(&self, id: &FragmentId) -> bool {
        self.processed.contains(id)
    }

    /// UTXO sum plus account balance, saturating
    pub(crate) fn total_value(&self) -> Value {
        self.utxos
            .iter()
            .fold(self.account_balance, |acc, entry| acc.saturating_add(entry.value))
    }

    /// Record a transaction this wallet built and signed itself
    pub(crate) fn record_spend(&mut self, id: FragmentId, remaining_balance: Value) {
        self.account_balance = remaining_balance;
        self.processed.insert(id);
    }

    /// Apply one transaction; `false` when `id` was already seen.
    ///
    /// May leave the ledger partly updated on error, callers apply to a
    /// copy and swap it in on success.
    pub(crate) fn apply(&mut self, id: FragmentId, tx: &Transaction, keys: &KeyIndex) -> Result<bool> {
        if self.processed.contains(&id) {
            log::debug!("Fragment {} already processed", id);
            return Ok(false);
        }

        for input in tx.inputs() {
            match &input.source {
                InputSource::Utxo {
                    fragment_id,
                    output_index,
                } => {
                    if let Some(pos) = self.utxos.iter().position(|u| {
                        u.fragment_id == *fragment_id && u.output_index == *output_index
                    }) {
                        self.utxos.remove(pos);
                        log::debug!("UTXO {}:{} spent by {}", fragment_id, output_index, id);
                    }
                }
                InputSource::Account(key) if keys.is_account(key) => {
                    // Local balance may be stale until `set_state` reconciles it
                    self.account_balance = match self.account_balance.checked_sub(input.value) {
                        Some(balance) => balance,
                        None => {
                            log::warn!(
                                "⚠️  Fragment {} spends {} from an account holding {}",
                                id,
                                input.value,
                                self.account_balance
                            );
                            Value::zero()
                        }
                    };
                }
                InputSource::Account(_) => {}
            }
        }

        for (index, output) in tx.outputs().iter().enumerate() {
            match &output.address.kind {
                AddressKind::Single(key) => {
                    let Some(owner) = keys.owner_of(key) else {
                        continue;
                    };
                    let output_index = u8::try_from(index).map_err(|_| {
                        WalletError::invalid_fragment(format!("output index {} out of range", index))
                    })?;
                    log::debug!("Discovered UTXO {}:{} worth {}", id, output_index, output.value);
                    self.utxos.push(UtxoEntry {
                        fragment_id: id,
                        output_index,
                        value: output.value,
                        owner,
                    });
                }
                AddressKind::Account(key) if keys.is_account(key) => {
                    self.account_balance = self
                        .account_balance
                        .checked_add(output.value)
                        .ok_or_else(|| WalletError::invalid_fragment("account balance overflow"))?;
                    log::debug!("Account credited {} by {}", output.value, id);
                }
                AddressKind::Account(_) => {}
            }
        }

        self.processed.insert(id);
        Ok(true)
    }
}

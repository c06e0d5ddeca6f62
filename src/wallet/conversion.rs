//! Moving UTXO funds into the account
//!
//! Entries worth no more than the fee of spending them are reported as
//! ignored rather than converted. The wallet is not modified: the produced
//! transactions only become pending once the caller submits them.

use super::builder::{Balance, Signer, TransactionBuilder};
use super::funds::{KeyOwner, UtxoEntry};
use super::Wallet;
use crate::chain::transaction::{Input, InputSource, TxPayload, INPUT_SIZE, MAX_INPUTS, UTXO_WITNESS_SIZE};
use crate::chain::{Address, BlockDate, Value};
use crate::config::engine_config;
use crate::keys::SecretKey;
use crate::settings::{self, Settings};
use crate::{Result, WalletError};

/// Entries left out of every conversion transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IgnoredInputs {
    pub count: usize,
    pub value: Value,
}

impl IgnoredInputs {
    fn add(&mut self, entry: &UtxoEntry) {
        self.count += 1;
        self.value = self.value.saturating_add(entry.value);
    }
}

/// Ready-to-submit conversion transactions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    transactions: Vec<Vec<u8>>,
    ignored: IgnoredInputs,
}

impl Conversion {
    /// Serialized fragments in submission order
    pub fn transactions(&self) -> &[Vec<u8>] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&[u8]> {
        self.transactions
            .get(index)
            .map(Vec::as_slice)
            .ok_or(WalletError::IndexOutOfRange {
                index,
                len: self.transactions.len(),
            })
    }

    pub fn ignored(&self) -> IgnoredInputs {
        self.ignored
    }
}

impl Wallet {
    /// Build transactions moving every economical UTXO entry to the account
    pub fn convert(&self, settings: &Settings, valid_until: BlockDate) -> Result<Conversion> {
        let account = self.account_key()?;
        settings::check_slot(settings, valid_until)?;

        let destination = Address::account(settings.discrimination(), account.public_key());
        let marginal = settings
            .fees()
            .marginal(INPUT_SIZE + UTXO_WITNESS_SIZE)
            .ok_or_else(|| WalletError::TransactionBuilding("marginal fee overflows".to_string()))?;

        let ordered = self
            .funds
            .utxos()
            .iter()
            .filter(|entry| entry.owner == KeyOwner::Account)
            .chain(
                self.funds
                    .utxos()
                    .iter()
                    .filter(|entry| entry.owner != KeyOwner::Account),
            );

        let mut ignored = IgnoredInputs::default();
        let mut spendable = Vec::new();
        for entry in ordered {
            if entry.value <= marginal {
                log::debug!(
                    "Ignoring UTXO {}:{} worth {} (marginal fee {})",
                    entry.fragment_id,
                    entry.output_index,
                    entry.value,
                    marginal
                );
                ignored.add(entry);
            } else {
                spendable.push(entry);
            }
        }

        let batch_size = usize::from(engine_config().max_conversion_inputs).clamp(1, MAX_INPUTS);
        let mut transactions = Vec::new();

        for batch in spendable.chunks(batch_size) {
            let mut builder = TransactionBuilder::new(settings, TxPayload::NoPayload, valid_until);
            for entry in batch {
                let input = Input {
                    source: InputSource::Utxo {
                        fragment_id: entry.fragment_id,
                        output_index: entry.output_index,
                    },
                    value: entry.value,
                };
                builder.add_input(input, Signer::Utxo(self.owner_key(entry.owner)?))?;
            }

            let balance = Balance::ChangeTo(destination);
            let fee = builder.fee(&balance)?;
            let total = builder.total_input()?;
            if total <= fee {
                log::warn!(
                    "⚠️  Batch of {} entries worth {} does not cover its fee {}, ignoring",
                    batch.len(),
                    total,
                    fee
                );
                batch.iter().for_each(|entry| ignored.add(entry));
                continue;
            }

            let sealed = builder.seal(balance)?;
            log::debug!("Conversion batch {} moves {} with fee {}", sealed.id, total, sealed.fee);
            transactions.push(sealed.bytes);
        }

        log::info!(
            "✅ Conversion built {} transactions, ignored {} entries worth {}",
            transactions.len(),
            ignored.count,
            ignored.value
        );
        Ok(Conversion {
            transactions,
            ignored,
        })
    }

    fn owner_key(&self, owner: KeyOwner) -> Result<&SecretKey> {
        match owner {
            KeyOwner::Account => self.account_key(),
            KeyOwner::Legacy(index) => self
                .utxo_keys
                .get(index)
                .ok_or_else(|| WalletError::not_found(format!("no UTXO key at position {}", index))),
        }
    }
}

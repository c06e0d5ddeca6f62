//! Transaction assembly, fee balancing and signing
//!
//! Every input, output and witness has a fixed encoded size, so the fragment
//! size (and with it the linear fee) is known before any value is assigned.

use crate::chain::fragment::SIZE_PREFIX;
use crate::chain::transaction::{self, Input, Output, TxPayload, Witness};
use crate::chain::{
    Address, BlockDate, CertificateKind, Fragment, FragmentId, Transaction, Value,
};
use crate::keys::SecretKey;
use crate::settings::Settings;
use crate::{Result, WalletError};

/// Key and witness kind for one input
#[derive(Debug, Clone, Copy)]
pub(crate) enum Signer<'a> {
    Utxo(&'a SecretKey),
    Account { key: &'a SecretKey, counter: u32 },
}

impl Signer<'_> {
    fn witness_size(&self) -> usize {
        match self {
            Signer::Utxo(_) => transaction::UTXO_WITNESS_SIZE,
            Signer::Account { .. } => transaction::ACCOUNT_WITNESS_SIZE,
        }
    }

    fn sign(&self, block0_hash: &[u8; 32], sign_data_hash: &[u8; 32]) -> Witness {
        match self {
            Signer::Utxo(key) => Witness::new_utxo(block0_hash, sign_data_hash, key),
            Signer::Account { key, counter } => {
                Witness::new_account(block0_hash, sign_data_hash, *counter, key)
            }
        }
    }
}

/// How inputs and outputs are reconciled with the fee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Balance {
    /// Whatever the inputs hold beyond outputs and fee goes to this address
    ChangeTo(Address),
    /// The single input is sized to cover outputs and fee exactly
    ExactInput,
}

#[derive(Debug, Clone)]
pub(crate) struct Sealed {
    pub(crate) bytes: Vec<u8>,
    pub(crate) id: FragmentId,
    pub(crate) fee: Value,
}

pub(crate) struct TransactionBuilder<'a> {
    settings: &'a Settings,
    payload: TxPayload,
    valid_until: BlockDate,
    inputs: Vec<Input>,
    signers: Vec<Signer<'a>>,
    outputs: Vec<Output>,
}

impl<'a> TransactionBuilder<'a> {
    pub(crate) fn new(settings: &'a Settings, payload: TxPayload, valid_until: BlockDate) -> Self {
        Self {
            settings,
            payload,
            valid_until,
            inputs: Vec::new(),
            signers: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub(crate) fn add_input(&mut self, input: Input, signer: Signer<'a>) -> Result<()> {
        if self.inputs.len() >= transaction::MAX_INPUTS {
            return Err(WalletError::TransactionBuilding(format!(
                "a transaction holds at most {} inputs",
                transaction::MAX_INPUTS
            )));
        }
        self.inputs.push(input);
        self.signers.push(signer);
        Ok(())
    }

    pub(crate) fn total_input(&self) -> Result<Value> {
        Value::sum(self.inputs.iter().map(|i| i.value))
            .ok_or_else(|| WalletError::TransactionBuilding("input total overflows".to_string()))
    }

    fn total_output(&self) -> Result<Value> {
        Value::sum(self.outputs.iter().map(|o| o.value))
            .ok_or_else(|| WalletError::TransactionBuilding("output total overflows".to_string()))
    }

    fn certificate(&self) -> Option<CertificateKind> {
        match self.payload {
            TxPayload::NoPayload => None,
            TxPayload::VoteCast(_) => Some(CertificateKind::VoteCast),
        }
    }

    /// Encoded fragment size once balanced and signed
    fn fragment_size(&self, balance: &Balance) -> usize {
        let change_outputs = match balance {
            Balance::ChangeTo(_) => 1,
            Balance::ExactInput => 0,
        };
        let payload_size = match &self.payload {
            TxPayload::NoPayload => 0,
            TxPayload::VoteCast(cast) => {
                let mut buf = Vec::new();
                cast.write_to(&mut buf);
                buf.len()
            }
        };
        let witness_size: usize = self.signers.iter().map(Signer::witness_size).sum();

        SIZE_PREFIX
            + 1
            + payload_size
            + 2
            + 8
            + self.inputs.len() * transaction::INPUT_SIZE
            + (self.outputs.len() + change_outputs) * transaction::OUTPUT_SIZE
            + witness_size
    }

    pub(crate) fn fee(&self, balance: &Balance) -> Result<Value> {
        let size = self.fragment_size(balance);
        self.settings
            .fees()
            .calculate(self.certificate(), size)
            .ok_or_else(|| WalletError::TransactionBuilding(format!("fee for {} bytes overflows", size)))
    }

    /// Balance, sign and encode the transaction
    pub(crate) fn seal(mut self, balance: Balance) -> Result<Sealed> {
        let fee = self.fee(&balance)?;
        let spent = self
            .total_output()?
            .checked_add(fee)
            .ok_or_else(|| WalletError::TransactionBuilding("fee overflows".to_string()))?;

        match balance {
            Balance::ChangeTo(address) => {
                let available = self.total_input()?;
                let change = available.checked_sub(spent).ok_or(WalletError::NotEnoughFunds {
                    needed: spent.0,
                    available: available.0,
                })?;
                self.outputs.push(Output {
                    address,
                    value: change,
                });
            }
            Balance::ExactInput => match self.inputs.as_mut_slice() {
                [input] => input.value = spent,
                other => {
                    return Err(WalletError::TransactionBuilding(format!(
                        "exact balancing needs one input, got {}",
                        other.len()
                    )))
                }
            },
        }

        let sign_data = transaction::sign_data(&self.payload, self.valid_until, &self.inputs, &self.outputs);
        let sign_data_hash = crate::chain::blake2b256(&[sign_data.as_slice()]);
        let block0_hash = self.settings.block0_initial_hash().as_bytes();
        let witnesses = self
            .signers
            .iter()
            .map(|signer| signer.sign(block0_hash, &sign_data_hash))
            .collect();

        let tx = Transaction::new(self.payload, self.valid_until, self.inputs, self.outputs, witnesses)
            .map_err(|e| WalletError::TransactionBuilding(e.to_string()))?;
        let fragment = Fragment::from_transaction(tx);
        let bytes = fragment.to_bytes()?;
        let id = fragment.id()?;

        log::debug!("Sealed fragment {} ({} bytes, fee {})", id, bytes.len(), fee);
        Ok(Sealed { bytes, id, fee })
    }
}

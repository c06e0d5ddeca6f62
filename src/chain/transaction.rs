//! Transaction structure
//!
//! ```text
//! payload | nb_inputs u8 | nb_outputs u8 | valid_until (epoch u32, slot u32)
//!         | inputs | outputs | witnesses
//! ```
//!
//! The sign data is everything before the witnesses. Witnesses sign
//! `tag | block0_hash | blake2b256(sign data)`, account witnesses append
//! their spending counter.

use super::address::Address;
use super::blake2b256;
use super::certificate::VoteCast;
use super::codec::{ByteReader, CodecError};
use super::fragment::FragmentId;
use super::time::BlockDate;
use super::value::Value;
use crate::keys::{PublicKey, SecretKey, Signature};

pub const INPUT_SIZE: usize = 1 + 8 + 32;
pub const OUTPUT_SIZE: usize = super::address::ADDRESS_SIZE + 8;
pub const UTXO_WITNESS_SIZE: usize = 1 + 64;
pub const ACCOUNT_WITNESS_SIZE: usize = 1 + 4 + 64;

pub const MAX_INPUTS: usize = 255;
pub const MAX_OUTPUTS: usize = 255;

const ACCOUNT_INPUT_MARKER: u8 = 0xff;
const WITNESS_TAG_UTXO: u8 = 1;
const WITNESS_TAG_ACCOUNT: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Utxo {
        fragment_id: FragmentId,
        output_index: u8,
    },
    Account(PublicKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Input {
    pub source: InputSource,
    pub value: Value,
}

impl Input {
    fn write_to(&self, out: &mut Vec<u8>) {
        let (marker, id) = match &self.source {
            InputSource::Utxo {
                fragment_id,
                output_index,
            } => (*output_index, fragment_id.0),
            InputSource::Account(key) => (ACCOUNT_INPUT_MARKER, key.0),
        };
        out.push(marker);
        out.extend_from_slice(&self.value.0.to_be_bytes());
        out.extend_from_slice(&id);
    }

    fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let marker = reader.u8()?;
        let value = Value(reader.u64()?);
        let id: [u8; 32] = reader.array()?;
        let source = if marker == ACCOUNT_INPUT_MARKER {
            InputSource::Account(PublicKey(id))
        } else {
            InputSource::Utxo {
                fragment_id: FragmentId(id),
                output_index: marker,
            }
        };
        Ok(Self { source, value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    pub address: Address,
    pub value: Value,
}

impl Output {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.address.to_bytes());
        out.extend_from_slice(&self.value.0.to_be_bytes());
    }

    fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            address: Address::read(reader)?,
            value: Value(reader.u64()?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Witness {
    Utxo(Signature),
    Account {
        spending_counter: u32,
        signature: Signature,
    },
}

impl Witness {
    fn utxo_message(block0_hash: &[u8; 32], sign_data_hash: &[u8; 32]) -> Vec<u8> {
        let mut message = Vec::with_capacity(65);
        message.push(WITNESS_TAG_UTXO);
        message.extend_from_slice(block0_hash);
        message.extend_from_slice(sign_data_hash);
        message
    }

    fn account_message(block0_hash: &[u8; 32], sign_data_hash: &[u8; 32], counter: u32) -> Vec<u8> {
        let mut message = Vec::with_capacity(69);
        message.push(WITNESS_TAG_ACCOUNT);
        message.extend_from_slice(block0_hash);
        message.extend_from_slice(sign_data_hash);
        message.extend_from_slice(&counter.to_be_bytes());
        message
    }

    pub fn new_utxo(block0_hash: &[u8; 32], sign_data_hash: &[u8; 32], key: &SecretKey) -> Self {
        Witness::Utxo(key.sign(&Self::utxo_message(block0_hash, sign_data_hash)))
    }

    pub fn new_account(
        block0_hash: &[u8; 32],
        sign_data_hash: &[u8; 32],
        spending_counter: u32,
        key: &SecretKey,
    ) -> Self {
        let message = Self::account_message(block0_hash, sign_data_hash, spending_counter);
        Witness::Account {
            spending_counter,
            signature: key.sign(&message),
        }
    }

    pub fn verify(&self, key: &PublicKey, block0_hash: &[u8; 32], sign_data_hash: &[u8; 32]) -> bool {
        match self {
            Witness::Utxo(signature) => {
                key.verify(&Self::utxo_message(block0_hash, sign_data_hash), signature)
            }
            Witness::Account {
                spending_counter,
                signature,
            } => key.verify(
                &Self::account_message(block0_hash, sign_data_hash, *spending_counter),
                signature,
            ),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Witness::Utxo(_) => UTXO_WITNESS_SIZE,
            Witness::Account { .. } => ACCOUNT_WITNESS_SIZE,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Witness::Utxo(signature) => {
                out.push(WITNESS_TAG_UTXO);
                out.extend_from_slice(&signature.0);
            }
            Witness::Account {
                spending_counter,
                signature,
            } => {
                out.push(WITNESS_TAG_ACCOUNT);
                out.extend_from_slice(&spending_counter.to_be_bytes());
                out.extend_from_slice(&signature.0);
            }
        }
    }

    fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        match reader.u8()? {
            WITNESS_TAG_UTXO => Ok(Witness::Utxo(Signature(reader.array()?))),
            WITNESS_TAG_ACCOUNT => Ok(Witness::Account {
                spending_counter: reader.u32()?,
                signature: Signature(reader.array()?),
            }),
            other => Err(CodecError::invalid(format!("unknown witness tag {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxPayload {
    NoPayload,
    VoteCast(VoteCast),
}

/// A transaction whose input and output counts fit the wire format and
/// which carries one witness per input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    payload: TxPayload,
    valid_until: BlockDate,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    witnesses: Vec<Witness>,
}

impl Transaction {
    pub fn new(
        payload: TxPayload,
        valid_until: BlockDate,
        inputs: Vec<Input>,
        outputs: Vec<Output>,
        witnesses: Vec<Witness>,
    ) -> Result<Self, CodecError> {
        if inputs.len() > MAX_INPUTS || outputs.len() > MAX_OUTPUTS {
            return Err(CodecError::invalid(format!(
                "{} inputs / {} outputs exceed the limit of {}",
                inputs.len(),
                outputs.len(),
                MAX_INPUTS
            )));
        }
        if witnesses.len() != inputs.len() {
            return Err(CodecError::invalid(format!(
                "{} witnesses for {} inputs",
                witnesses.len(),
                inputs.len()
            )));
        }
        Ok(Self {
            payload,
            valid_until,
            inputs,
            outputs,
            witnesses,
        })
    }

    pub fn payload(&self) -> &TxPayload {
        &self.payload
    }

    pub fn valid_until(&self) -> BlockDate {
        self.valid_until
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn witnesses(&self) -> &[Witness] {
        &self.witnesses
    }

    pub fn total_input(&self) -> Option<Value> {
        Value::sum(self.inputs.iter().map(|i| i.value))
    }

    pub fn total_output(&self) -> Option<Value> {
        Value::sum(self.outputs.iter().map(|o| o.value))
    }

    /// Serialized bytes covered by the witnesses
    pub fn sign_data(&self) -> Vec<u8> {
        sign_data(&self.payload, self.valid_until, &self.inputs, &self.outputs)
    }

    pub fn sign_data_hash(&self) -> [u8; 32] {
        blake2b256(&[self.sign_data().as_slice()])
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.sign_data());
        for witness in &self.witnesses {
            witness.write_to(out);
        }
    }

    /// Decode a transaction; the payload kind comes from the fragment tag
    pub fn read(reader: &mut ByteReader<'_>, with_vote_cast: bool) -> Result<Self, CodecError> {
        let payload = if with_vote_cast {
            TxPayload::VoteCast(VoteCast::read(reader)?)
        } else {
            TxPayload::NoPayload
        };

        let nb_inputs = usize::from(reader.u8()?);
        let nb_outputs = usize::from(reader.u8()?);
        let valid_until = BlockDate::new(reader.u32()?, reader.u32()?);

        let inputs = (0..nb_inputs)
            .map(|_| Input::read(reader))
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = (0..nb_outputs)
            .map(|_| Output::read(reader))
            .collect::<Result<Vec<_>, _>>()?;
        let witnesses = (0..nb_inputs)
            .map(|_| Witness::read(reader))
            .collect::<Result<Vec<_>, _>>()?;

        Transaction::new(payload, valid_until, inputs, outputs, witnesses)
    }
}

/// Sign data for a transaction under construction
pub fn sign_data(
    payload: &TxPayload,
    valid_until: BlockDate,
    inputs: &[Input],
    outputs: &[Output],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(10 + inputs.len() * INPUT_SIZE + outputs.len() * OUTPUT_SIZE);
    if let TxPayload::VoteCast(cast) = payload {
        cast.write_to(&mut out);
    }
    // Counts are bounded by Transaction::new and the builders
    out.push(inputs.len() as u8);
    out.push(outputs.len() as u8);
    out.extend_from_slice(&valid_until.epoch.to_be_bytes());
    out.extend_from_slice(&valid_until.slot_id.to_be_bytes());
    for input in inputs {
        input.write_to(&mut out);
    }
    for output in outputs {
        output.write_to(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::address::Discrimination;

    fn key(seed: u8) -> SecretKey {
        SecretKey::from_seed(&[seed; 32])
    }

    #[test]
    fn test_component_sizes() {
        let input = Input {
            source: InputSource::Account(key(1).public_key()),
            value: Value(5),
        };
        let output = Output {
            address: Address::account(Discrimination::Test, key(1).public_key()),
            value: Value(5),
        };
        let mut bytes = Vec::new();
        input.write_to(&mut bytes);
        assert_eq!(bytes.len(), INPUT_SIZE);

        bytes.clear();
        output.write_to(&mut bytes);
        assert_eq!(bytes.len(), OUTPUT_SIZE);
    }

    #[test]
    fn test_witness_binds_counter_and_block0() {
        let signer = key(3);
        let block0 = [1u8; 32];
        let hash = [2u8; 32];
        let witness = Witness::new_account(&block0, &hash, 7, &signer);

        assert_eq!(witness.size(), ACCOUNT_WITNESS_SIZE);
        assert!(witness.verify(&signer.public_key(), &block0, &hash));
        assert!(!witness.verify(&signer.public_key(), &[9u8; 32], &hash));

        let Witness::Account { signature, .. } = witness else {
            panic!("expected account witness");
        };
        let replayed = Witness::Account {
            spending_counter: 8,
            signature,
        };
        assert!(!replayed.verify(&signer.public_key(), &block0, &hash));
    }

    #[test]
    fn test_witness_count_must_match_inputs() {
        let input = Input {
            source: InputSource::Account(key(1).public_key()),
            value: Value(1),
        };
        let result = Transaction::new(
            TxPayload::NoPayload,
            BlockDate::default(),
            vec![input],
            vec![],
            vec![],
        );
        assert!(result.is_err());
    }
}

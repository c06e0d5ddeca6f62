//! Block parsing and genesis construction
//!
//! Header layout (82 bytes):
//!
//! ```text
//! version u16 | content_size u32 | epoch u32 | slot u32 | chain_length u32
//!             | content_hash[32] | parent_id[32]
//! ```
//!
//! The content is a sequence of size-prefixed fragments whose blake2b-256
//! digest must equal `content_hash`. The block id is the digest of the
//! header.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::address::{Address, Discrimination};
use super::blake2b256;
use super::codec::{ByteReader, CodecError};
use super::fee::{LinearFee, PerCertificateFee, PerVoteCertificateFee};
use super::fragment::{self, Fragment, FragmentId};
use super::params::{ConfigParam, ConfigParams};
use super::time::BlockDate;
use super::transaction::{Output, Transaction, TxPayload, MAX_OUTPUTS};
use super::value::Value;
use crate::{Result, WalletError};

pub const HEADER_SIZE: usize = 2 + 4 + 4 + 4 + 4 + 32 + 32;

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HeaderId(pub [u8; 32]);

impl HeaderId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for HeaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HeaderId({})", hex::encode(self.0))
    }
}

impl fmt::Display for HeaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for HeaderId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| WalletError::InvalidSettings(e.to_string()))?;
        let bytes: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            WalletError::InvalidSettings(format!("block0 hash must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(HeaderId(bytes))
    }
}

impl Serialize for HeaderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HeaderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub content_size: u32,
    pub date: BlockDate,
    pub chain_length: u32,
    pub content_hash: [u8; 32],
    pub parent_id: HeaderId,
}

impl Header {
    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE);
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(&self.content_size.to_be_bytes());
        out.extend_from_slice(&self.date.epoch.to_be_bytes());
        out.extend_from_slice(&self.date.slot_id.to_be_bytes());
        out.extend_from_slice(&self.chain_length.to_be_bytes());
        out.extend_from_slice(&self.content_hash);
        out.extend_from_slice(&self.parent_id.0);
        out
    }

    fn read(reader: &mut ByteReader<'_>) -> std::result::Result<Self, CodecError> {
        Ok(Self {
            version: reader.u16()?,
            content_size: reader.u32()?,
            date: BlockDate::new(reader.u32()?, reader.u32()?),
            chain_length: reader.u32()?,
            content_hash: reader.array()?,
            parent_id: HeaderId(reader.array()?),
        })
    }

    pub fn id(&self) -> HeaderId {
        HeaderId(blake2b256(&[self.to_bytes().as_slice()]))
    }
}

/// Parsed block: header plus every fragment this engine understands
#[derive(Debug, Clone)]
pub struct Block {
    header: Header,
    fragments: Vec<(FragmentId, Fragment)>,
}

impl Block {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read(bytes).map_err(|e| WalletError::malformed_block(e.to_string()))
    }

    fn read(bytes: &[u8]) -> std::result::Result<Self, CodecError> {
        let mut reader = ByteReader::new(bytes);
        let header = Header::read(&mut reader)?;
        let content = reader.rest();

        if content.len() != header.content_size as usize {
            return Err(CodecError::invalid(format!(
                "header announces {} content bytes, found {}",
                header.content_size,
                content.len()
            )));
        }
        if blake2b256(&[content]) != header.content_hash {
            return Err(CodecError::invalid("content hash mismatch"));
        }

        let mut fragments = Vec::new();
        let mut reader = ByteReader::new(content);
        while !reader.is_empty() {
            let (tag, raw) = fragment::read_framed(&mut reader)?;
            match Fragment::decode(tag, raw)? {
                Some(decoded) => fragments.push((fragment::id_of(tag, raw), decoded)),
                None => log::debug!("Skipping fragment with tag {}", tag),
            }
        }

        Ok(Self { header, fragments })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn id(&self) -> HeaderId {
        self.header.id()
    }

    pub fn fragments(&self) -> &[(FragmentId, Fragment)] {
        &self.fragments
    }

    /// Parameters of the initial fragment, which must come first
    pub fn initial_params(&self) -> Result<&ConfigParams> {
        match self.fragments.first() {
            Some((_, Fragment::Initial(params))) => Ok(params),
            _ => Err(WalletError::malformed_block(
                "first fragment is not an initial configuration",
            )),
        }
    }
}

/// Assembles a genesis block from configuration and initial funds
#[derive(Debug, Clone)]
pub struct Block0Builder {
    params: Vec<ConfigParam>,
    funds: Vec<Output>,
    fragments: Vec<Fragment>,
}

impl Block0Builder {
    /// Start with the parameters every genesis block carries
    pub fn new(
        discrimination: Discrimination,
        block0_date: u64,
        slots_per_epoch: u32,
        slot_duration: u8,
        fees: LinearFee,
    ) -> Self {
        let mut params = vec![
            ConfigParam::Discrimination(discrimination),
            ConfigParam::Block0Date(block0_date),
            ConfigParam::SlotsPerEpoch(slots_per_epoch),
            ConfigParam::SlotDuration(slot_duration),
            ConfigParam::LinearFee(LinearFee::new(
                fees.constant,
                fees.coefficient,
                fees.certificate,
            )),
        ];
        if fees.per_certificate_fees != PerCertificateFee::default() {
            params.push(ConfigParam::PerCertificateFees(fees.per_certificate_fees));
        }
        if fees.per_vote_certificate_fees != PerVoteCertificateFee::default() {
            params.push(ConfigParam::PerVoteCertificateFees(fees.per_vote_certificate_fees));
        }

        Self {
            params,
            funds: Vec::new(),
            fragments: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ConfigParam) -> Self {
        self.params.push(param);
        self
    }

    /// Credit `value` to `address` in the initial distribution
    pub fn with_fund(mut self, address: Address, value: Value) -> Self {
        self.funds.push(Output { address, value });
        self
    }

    /// Append an arbitrary fragment after the initial funds
    pub fn with_fragment(mut self, fragment: Fragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    pub fn build(self) -> Result<Vec<u8>> {
        let mut fragments = vec![Fragment::Initial(ConfigParams(self.params))];
        for chunk in self.funds.chunks(MAX_OUTPUTS) {
            let tx = Transaction::new(
                TxPayload::NoPayload,
                BlockDate::default(),
                Vec::new(),
                chunk.to_vec(),
                Vec::new(),
            )
            .map_err(|e| WalletError::malformed_block(e.to_string()))?;
            fragments.push(Fragment::Transaction(tx));
        }
        fragments.extend(self.fragments);

        let mut content = Vec::new();
        for fragment in &fragments {
            content.extend_from_slice(&fragment.to_bytes()?);
        }

        let header = Header {
            version: 0,
            content_size: u32::try_from(content.len())
                .map_err(|_| WalletError::malformed_block("block content too large"))?,
            date: BlockDate::default(),
            chain_length: 0,
            content_hash: blake2b256(&[content.as_slice()]),
            parent_id: HeaderId::default(),
        };

        let mut bytes = header.to_bytes();
        bytes.extend_from_slice(&content);
        log::debug!(
            "Built genesis block {} with {} fragments ({} bytes)",
            header.id(),
            fragments.len(),
            bytes.len()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SecretKey;

    fn builder() -> Block0Builder {
        Block0Builder::new(Discrimination::Test, 1_600_000_000, 100, 10, LinearFee::new(10, 1, 0))
    }

    #[test]
    fn test_genesis_parses_back() {
        let key = SecretKey::from_seed(&[8u8; 32]).public_key();
        let bytes = builder()
            .with_fund(Address::single(Discrimination::Test, key), Value(10))
            .with_fund(Address::account(Discrimination::Test, key), Value(20))
            .build()
            .unwrap();

        let block = Block::from_bytes(&bytes).unwrap();
        assert_eq!(block.fragments().len(), 2);
        assert_eq!(block.initial_params().unwrap().iter().count(), 5);

        let (id, fragment) = &block.fragments()[1];
        assert_eq!(*id, fragment.id().unwrap());
        assert_eq!(fragment.transaction().unwrap().outputs().len(), 2);
        assert_eq!(block.id(), Header::read(&mut ByteReader::new(&bytes)).unwrap().id());
    }

    #[test]
    fn test_funds_are_split_into_full_transactions() {
        let key = SecretKey::from_seed(&[8u8; 32]).public_key();
        let mut b = builder();
        for i in 0..300u64 {
            b = b.with_fund(Address::single(Discrimination::Test, key), Value(i + 1));
        }
        let block = Block::from_bytes(&b.build().unwrap()).unwrap();
        // initial config + 255 outputs + 45 outputs
        assert_eq!(block.fragments().len(), 3);
    }

    #[test]
    fn test_corruption_is_malformed_block() {
        let mut bytes = builder().build().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(
            Block::from_bytes(&bytes),
            Err(WalletError::MalformedBlock(_))
        ));

        assert!(matches!(
            Block::from_bytes(&bytes[..10]),
            Err(WalletError::MalformedBlock(_))
        ));
    }
}

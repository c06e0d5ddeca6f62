//! Fragment codec
//!
//! Wire form: `size u32 | tag u8 | content`, where `size` counts the tag and
//! content. The fragment id is blake2b-256 over `tag | content`; encoding is
//! canonical, so decoding and re-encoding reproduces the same id.

use std::fmt;
use std::str::FromStr;

use super::blake2b256;
use super::codec::{ByteReader, CodecError};
use super::params::ConfigParams;
use super::transaction::{Transaction, TxPayload};
use crate::{Result, WalletError};

pub const TAG_INITIAL: u8 = 0;
pub const TAG_TRANSACTION: u8 = 2;
pub const TAG_VOTE_CAST: u8 = 11;

/// Bytes of framing before the tag
pub const SIZE_PREFIX: usize = 4;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FragmentId(pub [u8; 32]);

impl FragmentId {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        bytes.try_into().map(FragmentId).map_err(|_| {
            WalletError::InvalidInput(format!("fragment id must be 32 bytes, got {}", bytes.len()))
        })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FragmentId({})", hex::encode(self.0))
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for FragmentId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| WalletError::InvalidInput(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Initial(ConfigParams),
    Transaction(Transaction),
    VoteCast(Transaction),
}

impl Fragment {
    /// Parse one size-prefixed fragment; trailing bytes are rejected
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let (tag, content) =
            read_framed(&mut reader).map_err(|e| WalletError::invalid_fragment(e.to_string()))?;
        reader
            .expect_end()
            .map_err(|e| WalletError::invalid_fragment(e.to_string()))?;

        match Self::decode(tag, content) {
            Ok(Some(fragment)) => Ok(fragment),
            Ok(None) => Err(WalletError::invalid_fragment(format!(
                "unsupported fragment tag {}",
                tag
            ))),
            Err(e) => Err(WalletError::invalid_fragment(e.to_string())),
        }
    }

    /// Decode the content of a known tag, `None` for tags this engine skips
    pub fn decode(tag: u8, content: &[u8]) -> std::result::Result<Option<Self>, CodecError> {
        let mut reader = ByteReader::new(content);
        let fragment = match tag {
            TAG_INITIAL => Fragment::Initial(ConfigParams::read(&mut reader)?),
            TAG_TRANSACTION => Fragment::Transaction(Transaction::read(&mut reader, false)?),
            TAG_VOTE_CAST => {
                let tx = Transaction::read(&mut reader, true)?;
                Fragment::VoteCast(tx)
            }
            _ => return Ok(None),
        };
        reader.expect_end()?;
        Ok(Some(fragment))
    }

    pub fn tag(&self) -> u8 {
        match self {
            Fragment::Initial(_) => TAG_INITIAL,
            Fragment::Transaction(_) => TAG_TRANSACTION,
            Fragment::VoteCast(_) => TAG_VOTE_CAST,
        }
    }

    /// Wrap a transaction in the fragment matching its payload
    pub fn from_transaction(tx: Transaction) -> Self {
        match tx.payload() {
            TxPayload::NoPayload => Fragment::Transaction(tx),
            TxPayload::VoteCast(_) => Fragment::VoteCast(tx),
        }
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            Fragment::Transaction(tx) | Fragment::VoteCast(tx) => Some(tx),
            Fragment::Initial(_) => None,
        }
    }

    fn content(&self) -> std::result::Result<Vec<u8>, CodecError> {
        let mut content = vec![self.tag()];
        match self {
            Fragment::Initial(params) => params.write_to(&mut content)?,
            Fragment::Transaction(tx) | Fragment::VoteCast(tx) => tx.write_to(&mut content),
        }
        Ok(content)
    }

    /// Serialized form including the size prefix
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let content = self
            .content()
            .map_err(|e| WalletError::invalid_fragment(e.to_string()))?;
        let size = u32::try_from(content.len())
            .map_err(|_| WalletError::invalid_fragment("fragment too large"))?;

        let mut bytes = Vec::with_capacity(SIZE_PREFIX + content.len());
        bytes.extend_from_slice(&size.to_be_bytes());
        bytes.extend_from_slice(&content);
        Ok(bytes)
    }

    pub fn id(&self) -> Result<FragmentId> {
        let content = self
            .content()
            .map_err(|e| WalletError::invalid_fragment(e.to_string()))?;
        Ok(FragmentId(blake2b256(&[content.as_slice()])))
    }
}

/// Read `size | tag | content`, returning the tag and content
pub fn read_framed<'a>(reader: &mut ByteReader<'a>) -> std::result::Result<(u8, &'a [u8]), CodecError> {
    let size = reader.u32()? as usize;
    if size == 0 {
        return Err(CodecError::invalid("empty fragment"));
    }
    let framed = reader.take(size)?;
    Ok((framed[0], &framed[1..]))
}

/// Id of framed content, as read by [`read_framed`]
pub fn id_of(tag: u8, content: &[u8]) -> FragmentId {
    FragmentId(blake2b256(&[&[tag][..], content]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::address::{Address, Discrimination};
    use crate::chain::time::BlockDate;
    use crate::chain::transaction::Output;
    use crate::chain::value::Value;
    use crate::keys::SecretKey;

    fn sample_transaction() -> Fragment {
        let key = SecretKey::from_seed(&[5u8; 32]);
        let output = Output {
            address: Address::single(Discrimination::Test, key.public_key()),
            value: Value(42),
        };
        let tx = Transaction::new(
            TxPayload::NoPayload,
            BlockDate::new(1, 2),
            vec![],
            vec![output],
            vec![],
        )
        .unwrap();
        Fragment::from_transaction(tx)
    }

    #[test]
    fn test_decode_reproduces_bytes_and_id() {
        let fragment = sample_transaction();
        let bytes = fragment.to_bytes().unwrap();

        let decoded = Fragment::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, fragment);
        assert_eq!(decoded.to_bytes().unwrap(), bytes);
        assert_eq!(decoded.id().unwrap(), fragment.id().unwrap());
        assert_eq!(id_of(bytes[4], &bytes[5..]), fragment.id().unwrap());
    }

    #[test]
    fn test_rejects_garbage() {
        let bytes = sample_transaction().to_bytes().unwrap();

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(matches!(
            Fragment::from_bytes(&trailing),
            Err(WalletError::InvalidFragment(_))
        ));

        assert!(Fragment::from_bytes(&bytes[..bytes.len() - 1]).is_err());

        let unknown = [0, 0, 0, 1, 0x33];
        assert!(matches!(
            Fragment::from_bytes(&unknown),
            Err(WalletError::InvalidFragment(_))
        ));
        assert!(Fragment::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_fragment_id_text_form() {
        let id = sample_transaction().id().unwrap();
        let parsed: FragmentId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("abcd".parse::<FragmentId>().is_err());
    }
}

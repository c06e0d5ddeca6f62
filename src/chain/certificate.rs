//! Vote cast certificate carried in a transaction payload

use std::fmt;
use std::str::FromStr;

use super::codec::{ByteReader, CodecError};
use crate::vote::encryption::EncryptedVote;
use crate::WalletError;

pub const VOTE_PLAN_ID_SIZE: usize = 32;

const PAYLOAD_PUBLIC: u8 = 1;
const PAYLOAD_PRIVATE: u8 = 2;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VotePlanId(pub [u8; VOTE_PLAN_ID_SIZE]);

impl VotePlanId {
    pub fn from_slice(bytes: &[u8]) -> crate::Result<Self> {
        bytes.try_into().map(VotePlanId).map_err(|_| {
            WalletError::InvalidInput(format!(
                "vote plan id must be {} bytes, got {}",
                VOTE_PLAN_ID_SIZE,
                bytes.len()
            ))
        })
    }
}

impl fmt::Debug for VotePlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VotePlanId({})", hex::encode(self.0))
    }
}

impl fmt::Display for VotePlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for VotePlanId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| WalletError::InvalidInput(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VotePayload {
    Public { choice: u8 },
    Private(EncryptedVote),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteCast {
    pub vote_plan: VotePlanId,
    pub proposal_index: u8,
    pub payload: VotePayload,
}

impl VoteCast {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.vote_plan.0);
        out.push(self.proposal_index);
        match &self.payload {
            VotePayload::Public { choice } => {
                out.push(PAYLOAD_PUBLIC);
                out.push(*choice);
            }
            VotePayload::Private(vote) => {
                out.push(PAYLOAD_PRIVATE);
                vote.write_to(out);
            }
        }
    }

    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let vote_plan = VotePlanId(reader.array()?);
        let proposal_index = reader.u8()?;
        let payload = match reader.u8()? {
            PAYLOAD_PUBLIC => VotePayload::Public {
                choice: reader.u8()?,
            },
            PAYLOAD_PRIVATE => VotePayload::Private(EncryptedVote::read(reader)?),
            other => {
                return Err(CodecError::invalid(format!(
                    "unknown vote payload type {}",
                    other
                )))
            }
        };

        Ok(Self {
            vote_plan,
            proposal_index,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_vote_layout() {
        let cast = VoteCast {
            vote_plan: VotePlanId([0xab; 32]),
            proposal_index: 4,
            payload: VotePayload::Public { choice: 1 },
        };
        let mut bytes = Vec::new();
        cast.write_to(&mut bytes);

        assert_eq!(bytes.len(), 32 + 1 + 1 + 1);
        assert_eq!(&bytes[32..], &[4, PAYLOAD_PUBLIC, 1]);

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(VoteCast::read(&mut reader).unwrap(), cast);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_vote_plan_id_parsing() {
        let hex_id = "00".repeat(31) + "01";
        let id: VotePlanId = hex_id.parse().unwrap();
        assert_eq!(id.0[31], 1);
        assert_eq!(id.to_string(), hex_id);

        assert!(matches!(
            VotePlanId::from_slice(&[0u8; 31]),
            Err(WalletError::InvalidInput(_))
        ));
    }
}

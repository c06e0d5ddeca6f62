//! Configuration parameters carried by the initial fragment
//!
//! `count u16`, then per entry `u16 (tag << 6 | len)` followed by `len`
//! bytes. Entries with unknown tags are kept verbatim.

use super::address::Discrimination;
use super::codec::{ByteReader, CodecError};
use super::fee::{LinearFee, PerCertificateFee, PerVoteCertificateFee};

const TAG_DISCRIMINATION: u16 = 1;
const TAG_BLOCK0_DATE: u16 = 2;
const TAG_SLOTS_PER_EPOCH: u16 = 4;
const TAG_SLOT_DURATION: u16 = 5;
const TAG_LINEAR_FEE: u16 = 10;
const TAG_PER_CERTIFICATE_FEES: u16 = 20;
const TAG_PER_VOTE_CERTIFICATE_FEES: u16 = 21;
const TAG_TRANSACTION_MAX_EXPIRY_EPOCHS: u16 = 23;

const LEN_BITS: u16 = 6;
const MAX_LEN: usize = (1 << LEN_BITS) - 1;
const MAX_TAG: u16 = u16::MAX >> LEN_BITS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigParam {
    Discrimination(Discrimination),
    Block0Date(u64),
    SlotsPerEpoch(u32),
    SlotDuration(u8),
    /// Only `constant`, `coefficient` and `certificate` are carried here
    LinearFee(LinearFee),
    PerCertificateFees(PerCertificateFee),
    PerVoteCertificateFees(PerVoteCertificateFee),
    TransactionMaxExpiryEpochs(u8),
    Unknown { tag: u16, payload: Vec<u8> },
}

impl ConfigParam {
    fn tag_and_payload(&self) -> (u16, Vec<u8>) {
        let mut payload = Vec::new();
        let tag = match self {
            ConfigParam::Discrimination(d) => {
                payload.push(match d {
                    Discrimination::Production => 0,
                    Discrimination::Test => 1,
                });
                TAG_DISCRIMINATION
            }
            ConfigParam::Block0Date(secs) => {
                payload.extend_from_slice(&secs.to_be_bytes());
                TAG_BLOCK0_DATE
            }
            ConfigParam::SlotsPerEpoch(n) => {
                payload.extend_from_slice(&n.to_be_bytes());
                TAG_SLOTS_PER_EPOCH
            }
            ConfigParam::SlotDuration(secs) => {
                payload.push(*secs);
                TAG_SLOT_DURATION
            }
            ConfigParam::LinearFee(fee) => {
                for v in [fee.constant, fee.coefficient, fee.certificate] {
                    payload.extend_from_slice(&v.to_be_bytes());
                }
                TAG_LINEAR_FEE
            }
            ConfigParam::PerCertificateFees(fees) => {
                for v in [
                    fees.pool_registration,
                    fees.stake_delegation,
                    fees.owner_stake_delegation,
                ] {
                    payload.extend_from_slice(&v.to_be_bytes());
                }
                TAG_PER_CERTIFICATE_FEES
            }
            ConfigParam::PerVoteCertificateFees(fees) => {
                for v in [fees.vote_plan, fees.vote_cast] {
                    payload.extend_from_slice(&v.to_be_bytes());
                }
                TAG_PER_VOTE_CERTIFICATE_FEES
            }
            ConfigParam::TransactionMaxExpiryEpochs(n) => {
                payload.push(*n);
                TAG_TRANSACTION_MAX_EXPIRY_EPOCHS
            }
            ConfigParam::Unknown { tag, payload: raw } => {
                payload.extend_from_slice(raw);
                *tag
            }
        };
        (tag, payload)
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let (tag, payload) = self.tag_and_payload();
        if tag > MAX_TAG || payload.len() > MAX_LEN {
            return Err(CodecError::invalid(format!(
                "config param tag {} with {} bytes does not fit the header",
                tag,
                payload.len()
            )));
        }
        let header = (tag << LEN_BITS) | payload.len() as u16;
        out.extend_from_slice(&header.to_be_bytes());
        out.extend_from_slice(&payload);
        Ok(())
    }

    fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let header = reader.u16()?;
        let tag = header >> LEN_BITS;
        let len = usize::from(header & MAX_LEN as u16);
        let mut payload = ByteReader::new(reader.take(len)?);

        let param = match tag {
            TAG_DISCRIMINATION => ConfigParam::Discrimination(match payload.u8()? {
                0 => Discrimination::Production,
                1 => Discrimination::Test,
                other => {
                    return Err(CodecError::invalid(format!(
                        "unknown discrimination {}",
                        other
                    )))
                }
            }),
            TAG_BLOCK0_DATE => ConfigParam::Block0Date(payload.u64()?),
            TAG_SLOTS_PER_EPOCH => ConfigParam::SlotsPerEpoch(payload.u32()?),
            TAG_SLOT_DURATION => ConfigParam::SlotDuration(payload.u8()?),
            TAG_LINEAR_FEE => ConfigParam::LinearFee(LinearFee::new(
                payload.u64()?,
                payload.u64()?,
                payload.u64()?,
            )),
            TAG_PER_CERTIFICATE_FEES => ConfigParam::PerCertificateFees(PerCertificateFee {
                pool_registration: payload.u64()?,
                stake_delegation: payload.u64()?,
                owner_stake_delegation: payload.u64()?,
            }),
            TAG_PER_VOTE_CERTIFICATE_FEES => {
                ConfigParam::PerVoteCertificateFees(PerVoteCertificateFee {
                    vote_plan: payload.u64()?,
                    vote_cast: payload.u64()?,
                })
            }
            TAG_TRANSACTION_MAX_EXPIRY_EPOCHS => {
                ConfigParam::TransactionMaxExpiryEpochs(payload.u8()?)
            }
            _ => {
                log::debug!("Keeping unknown config param tag {} ({} bytes)", tag, len);
                ConfigParam::Unknown {
                    tag,
                    payload: payload.rest().to_vec(),
                }
            }
        };
        payload.expect_end()?;
        Ok(param)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigParams(pub Vec<ConfigParam>);

impl ConfigParams {
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let count = u16::try_from(self.0.len())
            .map_err(|_| CodecError::invalid("too many config params"))?;
        out.extend_from_slice(&count.to_be_bytes());
        for param in &self.0 {
            param.write_to(out)?;
        }
        Ok(())
    }

    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let count = reader.u16()?;
        let params = (0..count)
            .map(|_| ConfigParam::read(reader))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ConfigParams(params))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigParam> {
        self.0.iter()
    }
}

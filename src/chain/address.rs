//! Ledger addresses
//!
//! Binary form is one header byte (test-network bit plus kind) followed by
//! the 32-byte public key. The text form is bech32 with `ca` / `ta` as the
//! human-readable part.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::codec::{ByteReader, CodecError};
use crate::keys::PublicKey;

pub const ADDRESS_SIZE: usize = 33;

const TEST_BIT: u8 = 0x80;
const KIND_SINGLE: u8 = 0x03;
const KIND_ACCOUNT: u8 = 0x05;

const HRP_PRODUCTION: &str = "ca";
const HRP_TEST: &str = "ta";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Discrimination {
    Production,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// UTXO-style output owned by a single key
    Single(PublicKey),
    /// Credit to an account balance
    Account(PublicKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub discrimination: Discrimination,
    pub kind: AddressKind,
}

impl Address {
    pub fn single(discrimination: Discrimination, key: PublicKey) -> Self {
        Self {
            discrimination,
            kind: AddressKind::Single(key),
        }
    }

    pub fn account(discrimination: Discrimination, key: PublicKey) -> Self {
        Self {
            discrimination,
            kind: AddressKind::Account(key),
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        match &self.kind {
            AddressKind::Single(key) | AddressKind::Account(key) => key,
        }
    }

    pub fn to_bytes(&self) -> [u8; ADDRESS_SIZE] {
        let mut out = [0u8; ADDRESS_SIZE];
        let kind = match self.kind {
            AddressKind::Single(_) => KIND_SINGLE,
            AddressKind::Account(_) => KIND_ACCOUNT,
        };
        out[0] = match self.discrimination {
            Discrimination::Production => kind,
            Discrimination::Test => kind | TEST_BIT,
        };
        out[1..].copy_from_slice(self.public_key().as_bytes());
        out
    }

    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let header = reader.u8()?;
        let key = PublicKey(reader.array()?);

        let discrimination = if header & TEST_BIT != 0 {
            Discrimination::Test
        } else {
            Discrimination::Production
        };
        let kind = match header & !TEST_BIT {
            KIND_SINGLE => AddressKind::Single(key),
            KIND_ACCOUNT => AddressKind::Account(key),
            other => {
                return Err(CodecError::invalid(format!(
                    "unknown address kind {:#04x}",
                    other
                )))
            }
        };

        Ok(Self {
            discrimination,
            kind,
        })
    }

    fn hrp(discrimination: Discrimination) -> &'static str {
        match discrimination {
            Discrimination::Production => HRP_PRODUCTION,
            Discrimination::Test => HRP_TEST,
        }
    }

    pub fn to_bech32(&self) -> Result<String, CodecError> {
        let hrp = Hrp::parse(Self::hrp(self.discrimination))
            .map_err(|e| CodecError::invalid(e.to_string()))?;
        bech32::encode::<Bech32>(hrp, &self.to_bytes()).map_err(|e| CodecError::invalid(e.to_string()))
    }

    pub fn from_bech32(text: &str) -> Result<Self, CodecError> {
        let (hrp, data) = bech32::decode(text).map_err(|e| CodecError::invalid(e.to_string()))?;
        let mut reader = ByteReader::new(&data);
        let address = Self::read(&mut reader)?;
        reader.expect_end()?;

        if hrp.as_str() != Self::hrp(address.discrimination) {
            return Err(CodecError::invalid(format!(
                "prefix '{}' does not match address discrimination",
                hrp
            )));
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_bech32().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

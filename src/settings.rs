//! Ledger settings
//!
//! Derived from a genesis block or built explicitly from [`SettingsInit`]
//! (which deserializes from JSON for deployments without a local genesis).
//! Immutable once built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::block::{Block, HeaderId};
use crate::chain::params::ConfigParam;
use crate::chain::{BlockDate, Discrimination, LinearFee, TimeEra};
use crate::{Result, WalletError};

const DEFAULT_MAX_EXPIRY_EPOCHS: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    fees: LinearFee,
    discrimination: Discrimination,
    block0_initial_hash: HeaderId,
    block0_date: u64,
    slot_duration: u8,
    time_era: TimeEra,
    transaction_max_expiry_epochs: u8,
}

/// Explicit construction parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsInit {
    pub fees: LinearFee,
    pub discrimination: Discrimination,
    /// Hex in JSON
    pub block0_initial_hash: HeaderId,
    /// Seconds since the unix epoch
    pub block0_date: u64,
    pub slot_duration: u8,
    pub time_era: TimeEra,
    pub transaction_max_expiry_epochs: u8,
}

impl SettingsInit {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| WalletError::InvalidSettings(e.to_string()))
    }
}

impl Settings {
    pub fn new(init: SettingsInit) -> Result<Self> {
        if init.time_era.slots_per_epoch() == 0 {
            return Err(WalletError::InvalidSettings(
                "slots_per_epoch must be positive".to_string(),
            ));
        }
        if init.slot_duration == 0 {
            return Err(WalletError::InvalidSettings(
                "slot_duration must be positive".to_string(),
            ));
        }

        Ok(Self {
            fees: init.fees,
            discrimination: init.discrimination,
            block0_initial_hash: init.block0_initial_hash,
            block0_date: init.block0_date,
            slot_duration: init.slot_duration,
            time_era: init.time_era,
            transaction_max_expiry_epochs: init.transaction_max_expiry_epochs,
        })
    }

    /// Parse a genesis block and read its configuration
    pub fn from_block(block0: &[u8]) -> Result<Self> {
        Self::from_parsed_block(&Block::from_bytes(block0)?)
    }

    pub(crate) fn from_parsed_block(block: &Block) -> Result<Self> {
        let mut discrimination = None;
        let mut block0_date = None;
        let mut slots_per_epoch = None;
        let mut slot_duration = None;
        let mut fees: Option<LinearFee> = None;
        let mut per_certificate_fees = None;
        let mut per_vote_certificate_fees = None;
        let mut max_expiry_epochs = None;

        for param in block.initial_params()?.iter() {
            match param {
                ConfigParam::Discrimination(d) => discrimination = Some(*d),
                ConfigParam::Block0Date(secs) => block0_date = Some(*secs),
                ConfigParam::SlotsPerEpoch(n) => slots_per_epoch = Some(*n),
                ConfigParam::SlotDuration(secs) => slot_duration = Some(*secs),
                ConfigParam::LinearFee(fee) => fees = Some(*fee),
                ConfigParam::PerCertificateFees(f) => per_certificate_fees = Some(*f),
                ConfigParam::PerVoteCertificateFees(f) => per_vote_certificate_fees = Some(*f),
                ConfigParam::TransactionMaxExpiryEpochs(n) => max_expiry_epochs = Some(*n),
                ConfigParam::Unknown { tag, .. } => {
                    log::debug!("Ignoring config param tag {}", tag)
                }
            }
        }

        let missing = |name: &str| WalletError::malformed_block(format!("missing {}", name));
        let mut fees = fees.ok_or_else(|| missing("linear fee"))?;
        fees.per_certificate_fees = per_certificate_fees.unwrap_or_default();
        fees.per_vote_certificate_fees = per_vote_certificate_fees.unwrap_or_default();

        let init = SettingsInit {
            fees,
            discrimination: discrimination.ok_or_else(|| missing("discrimination"))?,
            block0_initial_hash: block.id(),
            block0_date: block0_date.ok_or_else(|| missing("block0 date"))?,
            slot_duration: slot_duration.ok_or_else(|| missing("slot duration"))?,
            time_era: TimeEra::new(0, 0, slots_per_epoch.ok_or_else(|| missing("slots per epoch"))?),
            transaction_max_expiry_epochs: max_expiry_epochs.unwrap_or(DEFAULT_MAX_EXPIRY_EPOCHS),
        };

        Self::new(init).map_err(|e| WalletError::malformed_block(e.to_string()))
    }

    pub fn fees(&self) -> &LinearFee {
        &self.fees
    }

    pub fn discrimination(&self) -> Discrimination {
        self.discrimination
    }

    pub fn block0_initial_hash(&self) -> &HeaderId {
        &self.block0_initial_hash
    }

    /// Genesis time, seconds since the unix epoch
    pub fn block0_date(&self) -> u64 {
        self.block0_date
    }

    pub fn slot_duration(&self) -> u8 {
        self.slot_duration
    }

    pub fn time_era(&self) -> &TimeEra {
        &self.time_era
    }

    pub fn transaction_max_expiry_epochs(&self) -> u8 {
        self.transaction_max_expiry_epochs
    }
}

/// Chain date at wall-clock time `at`
pub fn block_date_from_system_time(settings: &Settings, at: DateTime<Utc>) -> Result<BlockDate> {
    let elapsed = u64::try_from(at.timestamp())
        .ok()
        .and_then(|now| now.checked_sub(settings.block0_date))
        .ok_or_else(|| WalletError::out_of_range(format!("{} is before the genesis block", at)))?;

    let slot = elapsed / u64::from(settings.slot_duration);
    settings
        .time_era
        .from_slot_to_era(slot)
        .ok_or_else(|| WalletError::out_of_range(format!("slot {} is outside the time era", slot)))
}

/// Latest expiry a transaction built at `at` may carry
pub fn max_expiration_date(settings: &Settings, at: DateTime<Utc>) -> Result<BlockDate> {
    let current = block_date_from_system_time(settings, at)?;
    let epoch = current
        .epoch
        .checked_add(u32::from(settings.transaction_max_expiry_epochs))
        .ok_or_else(|| WalletError::out_of_range("expiry epoch overflows"))?;
    Ok(BlockDate::new(epoch, settings.time_era.slots_per_epoch() - 1))
}

/// Check `valid_until` lies between the current date and the horizon
pub fn validate_expiry(settings: &Settings, valid_until: BlockDate, at: DateTime<Utc>) -> Result<()> {
    check_slot(settings, valid_until)?;

    let current = block_date_from_system_time(settings, at)?;
    if valid_until < current {
        return Err(WalletError::out_of_range(format!(
            "{} is earlier than the current date {}",
            valid_until, current
        )));
    }

    let horizon = max_expiration_date(settings, at)?;
    if valid_until > horizon {
        return Err(WalletError::out_of_range(format!(
            "{} is beyond the allowed horizon {}",
            valid_until, horizon
        )));
    }
    Ok(())
}

/// Check the slot number exists within an epoch
pub fn check_slot(settings: &Settings, date: BlockDate) -> Result<()> {
    if date.slot_id >= settings.time_era.slots_per_epoch() {
        return Err(WalletError::out_of_range(format!(
            "slot {} does not exist in epochs of {} slots",
            date.slot_id,
            settings.time_era.slots_per_epoch()
        )));
    }
    Ok(())
}

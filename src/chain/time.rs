use serde::{Deserialize, Serialize};
use std::fmt;

/// Epoch/slot position on the chain
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockDate {
    pub epoch: u32,
    pub slot_id: u32,
}

impl BlockDate {
    pub fn new(epoch: u32, slot_id: u32) -> Self {
        Self { epoch, slot_id }
    }
}

impl fmt::Display for BlockDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.epoch, self.slot_id)
    }
}

/// Mapping between absolute slot numbers and epoch/slot dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEra {
    epoch_start: u32,
    slot_start: u64,
    slots_per_epoch: u32,
}

impl TimeEra {
    pub fn new(epoch_start: u32, slot_start: u64, slots_per_epoch: u32) -> Self {
        Self {
            epoch_start,
            slot_start,
            slots_per_epoch,
        }
    }

    pub fn epoch_start(&self) -> u32 {
        self.epoch_start
    }

    pub fn slot_start(&self) -> u64 {
        self.slot_start
    }

    pub fn slots_per_epoch(&self) -> u32 {
        self.slots_per_epoch
    }

    /// Date of an absolute slot, `None` before the era starts
    pub fn from_slot_to_era(&self, slot: u64) -> Option<BlockDate> {
        if self.slots_per_epoch == 0 {
            return None;
        }
        let relative = slot.checked_sub(self.slot_start)?;
        let per_epoch = u64::from(self.slots_per_epoch);
        let epoch = u32::try_from(relative / per_epoch)
            .ok()?
            .checked_add(self.epoch_start)?;
        let slot_id = (relative % per_epoch) as u32;
        Some(BlockDate { epoch, slot_id })
    }

    /// Absolute slot of a date, `None` if the date is outside the era
    pub fn from_era_to_slot(&self, date: BlockDate) -> Option<u64> {
        if date.slot_id >= self.slots_per_epoch {
            return None;
        }
        let epochs = u64::from(date.epoch.checked_sub(self.epoch_start)?);
        epochs
            .checked_mul(u64::from(self.slots_per_epoch))?
            .checked_add(u64::from(date.slot_id))?
            .checked_add(self.slot_start)
    }

    pub fn contains(&self, date: BlockDate) -> bool {
        self.from_era_to_slot(date).is_some()
    }
}

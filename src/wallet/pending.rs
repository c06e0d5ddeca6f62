//! Submitted but unconfirmed transactions

use crate::chain::FragmentId;
use crate::{Result, WalletError};

/// Insertion-ordered set of in-flight fragment ids
#[derive(Debug, Clone, Default)]
pub(crate) struct PendingSet {
    ids: Vec<FragmentId>,
}

impl PendingSet {
    pub(crate) fn insert(&mut self, id: FragmentId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub(crate) fn remove(&mut self, id: &FragmentId) -> bool {
        match self.ids.iter().position(|pending| pending == id) {
            Some(pos) => {
                self.ids.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn snapshot(&self) -> PendingTransactions {
        PendingTransactions {
            ids: self.ids.clone(),
        }
    }
}

/// Point-in-time copy of the pending set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingTransactions {
    ids: Vec<FragmentId>,
}

impl PendingTransactions {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&FragmentId> {
        self.ids.get(index).ok_or(WalletError::IndexOutOfRange {
            index,
            len: self.ids.len(),
        })
    }

    pub fn contains(&self, id: &FragmentId) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FragmentId> {
        self.ids.iter()
    }
}

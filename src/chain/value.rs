use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount in the ledger's atomic unit
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Value(pub u64);

impl Value {
    pub const fn zero() -> Self {
        Value(0)
    }

    pub fn checked_add(self, other: Value) -> Option<Value> {
        self.0.checked_add(other.0).map(Value)
    }

    pub fn checked_sub(self, other: Value) -> Option<Value> {
        self.0.checked_sub(other.0).map(Value)
    }

    pub fn saturating_add(self, other: Value) -> Value {
        Value(self.0.saturating_add(other.0))
    }

    /// Sum of all values, `None` on overflow
    pub fn sum<I: IntoIterator<Item = Value>>(values: I) -> Option<Value> {
        values
            .into_iter()
            .try_fold(Value::zero(), |acc, v| acc.checked_add(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value(v)
    }
}

impl From<Value> for u64 {
    fn from(v: Value) -> Self {
        v.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_detects_overflow() {
        assert_eq!(Value::sum([Value(1), Value(2), Value(3)]), Some(Value(6)));
        assert_eq!(Value::sum([Value(u64::MAX), Value(1)]), None);
        assert_eq!(Value::sum(std::iter::empty()), Some(Value::zero()));
    }
}

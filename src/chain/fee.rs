//! Linear fee model
//!
//! `fee = constant + coefficient × size_in_bytes + certificate_fee`, where
//! the certificate fee comes from the per-kind tables and falls back to the
//! flat `certificate` amount when the specific entry is zero.

use serde::{Deserialize, Serialize};

use super::value::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerCertificateFee {
    pub pool_registration: u64,
    pub stake_delegation: u64,
    pub owner_stake_delegation: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerVoteCertificateFee {
    pub vote_plan: u64,
    pub vote_cast: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateKind {
    PoolRegistration,
    StakeDelegation,
    OwnerStakeDelegation,
    VotePlan,
    VoteCast,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearFee {
    pub constant: u64,
    pub coefficient: u64,
    pub certificate: u64,
    #[serde(default)]
    pub per_certificate_fees: PerCertificateFee,
    #[serde(default)]
    pub per_vote_certificate_fees: PerVoteCertificateFee,
}

impl LinearFee {
    pub fn new(constant: u64, coefficient: u64, certificate: u64) -> Self {
        Self {
            constant,
            coefficient,
            certificate,
            ..Default::default()
        }
    }

    pub fn certificate_fee(&self, kind: CertificateKind) -> u64 {
        let specific = match kind {
            CertificateKind::PoolRegistration => self.per_certificate_fees.pool_registration,
            CertificateKind::StakeDelegation => self.per_certificate_fees.stake_delegation,
            CertificateKind::OwnerStakeDelegation => {
                self.per_certificate_fees.owner_stake_delegation
            }
            CertificateKind::VotePlan => self.per_vote_certificate_fees.vote_plan,
            CertificateKind::VoteCast => self.per_vote_certificate_fees.vote_cast,
        };
        if specific == 0 {
            self.certificate
        } else {
            specific
        }
    }

    /// Fee for a fragment of `size_bytes`, `None` on overflow
    pub fn calculate(&self, certificate: Option<CertificateKind>, size_bytes: usize) -> Option<Value> {
        let size = u64::try_from(size_bytes).ok()?;
        let certificate_fee = certificate.map_or(0, |kind| self.certificate_fee(kind));
        self.coefficient
            .checked_mul(size)?
            .checked_add(self.constant)?
            .checked_add(certificate_fee)
            .map(Value)
    }

    /// What adding `extra_bytes` to a transaction costs
    pub fn marginal(&self, extra_bytes: usize) -> Option<Value> {
        self.coefficient
            .checked_mul(u64::try_from(extra_bytes).ok()?)
            .map(Value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_fee() {
        let fee = LinearFee::new(10, 2, 0);
        assert_eq!(fee.calculate(None, 100), Some(Value(210)));
        assert_eq!(fee.marginal(106), Some(Value(212)));
    }

    #[test]
    fn test_vote_cast_fee_falls_back_to_certificate() {
        let mut fee = LinearFee::new(1, 1, 500);
        assert_eq!(fee.certificate_fee(CertificateKind::VoteCast), 500);
        assert_eq!(fee.calculate(Some(CertificateKind::VoteCast), 10), Some(Value(511)));

        fee.per_vote_certificate_fees.vote_cast = 7;
        assert_eq!(fee.calculate(Some(CertificateKind::VoteCast), 10), Some(Value(18)));
    }

    #[test]
    fn test_overflow_is_reported() {
        let fee = LinearFee::new(u64::MAX, 1, 0);
        assert_eq!(fee.calculate(None, 1), None);
    }
}

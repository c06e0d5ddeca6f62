use rand::{CryptoRng, RngCore};

use super::encryption::{ElectionPublicKey, EncryptedVote};
use crate::chain::certificate::{VoteCast, VotePayload, VotePlanId};
use crate::{Result, WalletError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadType {
    Public,
    Private(ElectionPublicKey),
}

/// One question of a vote plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    vote_plan_id: VotePlanId,
    index: u8,
    num_choices: u8,
    payload_type: PayloadType,
}

impl Proposal {
    pub fn new(
        vote_plan_id: VotePlanId,
        index: u8,
        num_choices: u8,
        payload_type: PayloadType,
    ) -> Result<Self> {
        if num_choices == 0 {
            return Err(WalletError::InvalidInput(
                "a proposal needs at least one choice".to_string(),
            ));
        }
        Ok(Self {
            vote_plan_id,
            index,
            num_choices,
            payload_type,
        })
    }

    pub fn new_public(vote_plan_id: VotePlanId, index: u8, num_choices: u8) -> Result<Self> {
        Self::new(vote_plan_id, index, num_choices, PayloadType::Public)
    }

    /// Private proposal; `encryption_key` is the `ristretto255_votepk` text form
    pub fn new_private(
        vote_plan_id: VotePlanId,
        index: u8,
        num_choices: u8,
        encryption_key: &str,
    ) -> Result<Self> {
        let key = ElectionPublicKey::from_bech32(encryption_key)?;
        Self::new(vote_plan_id, index, num_choices, PayloadType::Private(key))
    }

    pub fn vote_plan_id(&self) -> &VotePlanId {
        &self.vote_plan_id
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn num_choices(&self) -> u8 {
        self.num_choices
    }

    pub fn payload_type(&self) -> &PayloadType {
        &self.payload_type
    }

    pub fn validate_choice(&self, choice: u8) -> Result<()> {
        if choice >= self.num_choices {
            return Err(WalletError::InvalidChoice {
                choice,
                num_choices: self.num_choices,
            });
        }
        Ok(())
    }

    /// Certificate casting `choice`, encrypted when the proposal is private
    pub fn vote<R: RngCore + CryptoRng>(&self, choice: u8, rng: &mut R) -> Result<VoteCast> {
        self.validate_choice(choice)?;

        let payload = match &self.payload_type {
            PayloadType::Public => VotePayload::Public { choice },
            PayloadType::Private(key) => {
                VotePayload::Private(EncryptedVote::encrypt(key, self.num_choices, choice, rng))
            }
        };

        Ok(VoteCast {
            vote_plan: self.vote_plan_id,
            proposal_index: self.index,
            payload,
        })
    }
}

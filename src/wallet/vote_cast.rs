//! Vote-cast transactions spent from the account

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use super::builder::{Balance, Signer, TransactionBuilder};
use super::Wallet;
use crate::chain::transaction::{Input, InputSource, TxPayload};
use crate::chain::{BlockDate, Value};
use crate::settings::{self, Settings};
use crate::vote::Proposal;
use crate::{Result, WalletError};

impl Wallet {
    /// Cast `choice` on `proposal`, checking `valid_until` against the wall clock
    pub fn vote(
        &mut self,
        settings: &Settings,
        proposal: &Proposal,
        choice: u8,
        valid_until: BlockDate,
    ) -> Result<Vec<u8>> {
        self.vote_at(settings, proposal, choice, valid_until, Utc::now())
    }

    pub fn vote_at(
        &mut self,
        settings: &Settings,
        proposal: &Proposal,
        choice: u8,
        valid_until: BlockDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<u8>> {
        self.vote_with_rng(settings, proposal, choice, valid_until, now, &mut OsRng)
    }

    /// Build, sign and record a vote-cast fragment.
    ///
    /// On success the spending counter advances by one, the fee is taken
    /// from the account balance and the fragment id becomes pending. On
    /// failure nothing changes.
    pub fn vote_with_rng<R: RngCore + CryptoRng>(
        &mut self,
        settings: &Settings,
        proposal: &Proposal,
        choice: u8,
        valid_until: BlockDate,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Vec<u8>> {
        let account = self.account_key()?;
        proposal.validate_choice(choice)?;
        settings::validate_expiry(settings, valid_until, now)?;

        let cast = proposal.vote(choice, rng)?;
        let counter = self.spending_counter;
        let next_counter = counter.checked_add(1).ok_or_else(|| {
            WalletError::TransactionBuilding("spending counter exhausted".to_string())
        })?;

        let mut builder = TransactionBuilder::new(settings, TxPayload::VoteCast(cast), valid_until);
        builder.add_input(
            Input {
                source: InputSource::Account(account.public_key()),
                value: Value::zero(),
            },
            Signer::Account {
                key: account,
                counter,
            },
        )?;

        let fee = builder.fee(&Balance::ExactInput)?;
        let available = self.funds.account_balance();
        let remaining = available
            .checked_sub(fee)
            .ok_or(WalletError::NotEnoughFunds {
                needed: fee.0,
                available: available.0,
            })?;

        let sealed = builder.seal(Balance::ExactInput)?;

        self.spending_counter = next_counter;
        self.funds.record_spend(sealed.id, remaining);
        self.pending.insert(sealed.id);

        log::info!(
            "🗳️  Vote cast on proposal {} of plan {} as {} (fee {}, counter {})",
            proposal.index(),
            proposal.vote_plan_id(),
            sealed.id,
            sealed.fee,
            next_counter
        );
        Ok(sealed.bytes)
    }
}

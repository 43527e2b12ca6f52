//! Per-depositor state.

use serde::{Deserialize, Serialize};

use silo_core::address::Address;
use silo_core::error::LedgerError;

/// A depositor's stake and reward bookkeeping.
///
/// Pending reward is `amount * acc_reward_per_share / precision - reward_debt`.
/// Resyncing the debt after every change of `amount` keeps reward accrued
/// before the change out of later pending figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPosition {
    pub amount: u128,
    pub reward_debt: u128,
    pub referrer: Option<Address>,
    pub referral_commission_earned: u128,
    pub total_earned: u128,
}

impl UserPosition {
    /// Reward entitlement of the current stake at accumulator value `acc`.
    pub fn accrued(&self, acc_reward_per_share: u128, precision: u128) -> Result<u128, LedgerError> {
        self.amount
            .checked_mul(acc_reward_per_share)
            .map(|v| v / precision)
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    /// Reward accrued since the last debt sync.
    pub fn pending(&self, acc_reward_per_share: u128, precision: u128) -> Result<u128, LedgerError> {
        Ok(self
            .accrued(acc_reward_per_share, precision)?
            .saturating_sub(self.reward_debt))
    }

    /// Mark everything accrued so far as settled.
    pub fn sync_debt(&mut self, acc_reward_per_share: u128, precision: u128) -> Result<(), LedgerError> {
        self.reward_debt = self.accrued(acc_reward_per_share, precision)?;
        Ok(())
    }

    /// Bind `candidate` as referrer if none is bound yet.
    ///
    /// Ignores a missing, zero, or self referrer. Returns the newly bound
    /// referrer, if any.
    pub fn bind_referrer(&mut self, owner: &Address, candidate: Option<Address>) -> Option<Address> {
        if self.referrer.is_some() {
            return None;
        }
        let candidate = candidate.filter(|r| !r.is_zero() && r != owner)?;
        self.referrer = Some(candidate);
        Some(candidate)
    }
}

//! Deposit allocation.
//!
//! After the deposit fee is taken, the remaining amount cascades through
//! three legs, each consuming from what the previous one left:
//!
//! 1. **Upline**: a referral commission paid straight to the bound referrer.
//! 2. **Liquidity**: half is swapped into the reward token, both halves land
//!    at the liquidity collector, which pairs them and burns the shares.
//! 3. **Buyback**: swapped into the reward token and delivered to the burn
//!    address.
//!
//! [`AllocationPlan`] is the pure arithmetic. [`DepositAllocator`] executes
//! a plan against the collaborators and measures what actually arrived.

use tracing::debug;

use silo_core::address::Address;
use silo_core::constants::{apply_bps, mul_div_floor};
use silo_core::error::ExternalError;
use silo_core::traits::Token;

use crate::config::{ReferralSplit, Split};
use crate::ledger::Collaborators;

/// How one deposit is divided between the legs. The three parts always sum
/// to the planned amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationPlan {
    pub upline: u128,
    pub liquidity: u128,
    pub buyback: u128,
}

impl AllocationPlan {
    /// Plan the allocation of `amount`.
    ///
    /// `referred` selects the referral split, which pays the upline first and
    /// divides the rest by its own liquidity/buyback ratio. With both ratio
    /// weights at zero the liquidity and buyback legs are disabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use silo_ledger::{AllocationPlan, ReferralSplit, Split};
    /// let plan = AllocationPlan::compute(980, false, &Split::default(), &ReferralSplit::default());
    /// assert_eq!((plan.upline, plan.liquidity, plan.buyback), (0, 98, 882));
    /// ```
    pub fn compute(amount: u128, referred: bool, split: &Split, referral: &ReferralSplit) -> Self {
        let (upline, liquidity_bps, buyback_bps) = if referred {
            (
                apply_bps(amount, referral.upline_bps),
                referral.liquidity_bps,
                referral.buyback_bps,
            )
        } else {
            (0, split.liquidity_bps, split.buyback_bps)
        };

        let remaining = amount - upline;
        let weight = liquidity_bps.saturating_add(buyback_bps);
        if weight == 0 {
            return Self { upline, ..Self::default() };
        }

        let liquidity = mul_div_floor(remaining, liquidity_bps, weight);
        Self {
            upline,
            liquidity,
            buyback: remaining - liquidity,
        }
    }

    pub fn total(&self) -> u128 {
        self.upline + self.liquidity + self.buyback
    }
}

/// What a plan achieved once executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocationReport {
    /// Commission sent to the referrer.
    pub upline_paid: u128,
    /// Liquidity leg amount, counted only when the pairing went through.
    pub liquidified: u128,
    pub lp_burned: u128,
    /// Buyback leg amount, counted only when the swap delivered something.
    pub buyback_spent: u128,
    /// Reward tokens that reached the burn address.
    pub bought_back: u128,
}

/// Executes allocation plans out of the ledger's staked-token custody.
pub struct DepositAllocator<'a> {
    collab: &'a Collaborators,
    ledger: Address,
    burn: Address,
    deadline: u64,
}

impl<'a> DepositAllocator<'a> {
    pub fn new(collab: &'a Collaborators, ledger: Address, burn: Address, deadline: u64) -> Self {
        Self {
            collab,
            ledger,
            burn,
            deadline,
        }
    }

    /// Run every non-zero leg of `plan` in order. Any collaborator failure
    /// aborts the allocation.
    pub fn execute(
        &self,
        plan: &AllocationPlan,
        referrer: Option<Address>,
    ) -> Result<AllocationReport, ExternalError> {
        let mut report = AllocationReport::default();

        if let Some(referrer) = referrer.filter(|_| plan.upline > 0) {
            self.collab.staked.transfer(&self.ledger, &referrer, plan.upline)?;
            report.upline_paid = plan.upline;
            debug!(%referrer, amount = plan.upline, "upline paid");
        }

        if plan.liquidity > 0 {
            let lp_burned = self.liquidify(plan.liquidity)?;
            if let Some(lp_burned) = lp_burned {
                report.liquidified = plan.liquidity;
                report.lp_burned = lp_burned;
            }
        } else {
            debug!("liquidity leg empty, skipped");
        }

        if plan.buyback > 0 {
            let bought = self.swap_to_reward(plan.buyback, &self.burn)?;
            if bought > 0 {
                report.buyback_spent = plan.buyback;
                report.bought_back = bought;
            }
            debug!(amount_in = plan.buyback, bought, "buyback swapped");
        } else {
            debug!("buyback leg empty, skipped");
        }

        Ok(report)
    }

    /// Returns the shares burned, or `None` when the swap delivered nothing
    /// and the pairing was not attempted.
    fn liquidify(&self, amount: u128) -> Result<Option<u128>, ExternalError> {
        let collector = self.collab.collector.address();
        let half = amount / 2;
        let other = amount - half;

        let swapped = if half > 0 {
            self.swap_to_reward(half, &collector)?
        } else {
            0
        };
        if other > 0 {
            self.collab.staked.transfer(&self.ledger, &collector, other)?;
        }

        if swapped == 0 {
            debug!(amount, "liquidity swap returned nothing; funds left at collector");
            return Ok(None);
        }
        let lp_burned = self.collab.collector.add_liquidity_and_burn()?;
        debug!(amount, swapped, lp_burned, "liquidity added and burned");
        Ok(Some(lp_burned))
    }

    /// Swap staked token into reward token for `recipient` and return the
    /// recipient's measured balance increase.
    fn swap_to_reward(&self, amount: u128, recipient: &Address) -> Result<u128, ExternalError> {
        let before = self.collab.reward.balance_of(recipient);
        self.collab.router.exact_input(
            &self.ledger,
            amount,
            &self.collab.staked.address(),
            &self.collab.reward.address(),
            recipient,
            self.deadline,
        )?;
        Ok(self.collab.reward.balance_of(recipient).saturating_sub(before))
    }
}

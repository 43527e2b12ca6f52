//! Reward-per-share accumulator.
//!
//! Reward accrues per block inside `[start_block, end_block]` and is spread
//! over the total stake by growing `acc_reward_per_share`, a fixed-point
//! value scaled by `precision`. Nothing ticks in the background: every
//! entry point calls [`RewardAccumulator::settle`] first, which catches the
//! accumulator up to the current height in one step.
//!
//! Settlement is a pure state transition. The caller mints what the
//! returned [`Accrual`] reports (`reward` to the ledger, `dev_reward` on top
//! to the dev fund) and rolls the accumulator back if minting fails.

use serde::{Deserialize, Serialize};
use tracing::debug;

use silo_core::constants::DEV_MINT_DIVISOR;
use silo_core::emission::EmissionSchedule;
use silo_core::error::LedgerError;

/// Reward generated by one settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    /// Rewarded blocks after clamping to the window end.
    pub blocks: u64,
    /// Reward owed to stakers, minted to the ledger.
    pub reward: u128,
    /// Extra supply minted to the dev fund.
    pub dev_reward: u128,
    /// `(old, new)` when emission decay changed the rate.
    pub rate_change: Option<(u128, u128)>,
}

/// Outcome of [`RewardAccumulator::settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Already settled at or beyond the requested height.
    Current,
    /// Nothing staked; the accrual point moved without accruing.
    Idle { from: u64, to: u64 },
    Accrued(Accrual),
}

/// Rewarded blocks between `from` and `to`, with accrual stopping at `end`.
///
/// # Examples
///
/// ```
/// use silo_ledger::accumulator::block_span;
/// assert_eq!(block_span(10, 20, 100), 10);
/// assert_eq!(block_span(95, 120, 100), 5);
/// assert_eq!(block_span(100, 120, 100), 0);
/// ```
pub fn block_span(from: u64, to: u64, end: u64) -> u64 {
    if to <= end {
        to.saturating_sub(from)
    } else if from >= end {
        0
    } else {
        end - from
    }
}

/// Global reward-per-share ledger with its emission rate and window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAccumulator {
    acc_reward_per_share: u128,
    precision: u128,
    reward_per_block: u128,
    emission_updated_at: u64,
    last_accrual_block: u64,
    start_block: u64,
    end_block: u64,
    schedule: EmissionSchedule,
}

impl RewardAccumulator {
    /// Create an accumulator whose accrual point sits at `start_block`.
    pub fn new(
        precision: u128,
        reward_per_block: u128,
        start_block: u64,
        end_block: u64,
        now: u64,
        schedule: EmissionSchedule,
    ) -> Self {
        Self {
            acc_reward_per_share: 0,
            precision: precision.max(1),
            reward_per_block,
            emission_updated_at: now,
            last_accrual_block: start_block,
            start_block,
            end_block,
            schedule,
        }
    }

    pub fn acc_reward_per_share(&self) -> u128 {
        self.acc_reward_per_share
    }

    pub fn precision(&self) -> u128 {
        self.precision
    }

    /// The committed rate, before any decay not yet settled.
    pub fn reward_per_block(&self) -> u128 {
        self.reward_per_block
    }

    pub fn emission_updated_at(&self) -> u64 {
        self.emission_updated_at
    }

    pub fn last_accrual_block(&self) -> u64 {
        self.last_accrual_block
    }

    pub fn start_block(&self) -> u64 {
        self.start_block
    }

    pub fn end_block(&self) -> u64 {
        self.end_block
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    /// Whether `height` lies in `[start_block, end_block)`.
    pub fn is_active(&self, height: u64) -> bool {
        height >= self.start_block && height < self.end_block
    }

    /// The rate in effect at `now`, decay included.
    pub fn effective_rate(&self, now: u64) -> u128 {
        self.schedule
            .current_rate(self.reward_per_block, self.emission_updated_at, now)
    }

    /// Advance the accumulator to `height`.
    pub fn settle(
        &mut self,
        now: u64,
        height: u64,
        total_staked: u128,
    ) -> Result<Settlement, LedgerError> {
        if height <= self.last_accrual_block {
            return Ok(Settlement::Current);
        }

        if total_staked == 0 {
            let from = self.last_accrual_block;
            self.last_accrual_block = height;
            return Ok(Settlement::Idle { from, to: height });
        }

        let rate = self.effective_rate(now);
        let rate_change = (rate != self.reward_per_block).then_some((self.reward_per_block, rate));
        let (blocks, reward, increment) = self.step(rate, height, total_staked)?;
        let acc = self
            .acc_reward_per_share
            .checked_add(increment)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        if rate_change.is_some() {
            self.reward_per_block = rate;
            self.emission_updated_at = now;
        }
        self.acc_reward_per_share = acc;
        self.last_accrual_block = height;

        debug!(blocks, reward, acc, "accumulator settled");
        Ok(Settlement::Accrued(Accrual {
            blocks,
            reward,
            dev_reward: reward / DEV_MINT_DIVISOR,
            rate_change,
        }))
    }

    /// Accumulator value a settlement at `height` would produce, without
    /// committing anything.
    pub fn projected_acc(&self, now: u64, height: u64, total_staked: u128) -> Result<u128, LedgerError> {
        if height <= self.last_accrual_block || total_staked == 0 {
            return Ok(self.acc_reward_per_share);
        }
        let (_, _, increment) = self.step(self.effective_rate(now), height, total_staked)?;
        self.acc_reward_per_share
            .checked_add(increment)
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    /// Shared by settlement and projection so both round identically.
    fn step(&self, rate: u128, height: u64, total_staked: u128) -> Result<(u64, u128, u128), LedgerError> {
        let blocks = block_span(self.last_accrual_block, height, self.end_block);
        let reward = u128::from(blocks)
            .checked_mul(rate)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let increment = reward
            .checked_mul(self.precision)
            .ok_or(LedgerError::ArithmeticOverflow)?
            / total_staked;
        Ok((blocks, reward, increment))
    }

    /// Set the rate by hand. Rebases the decay clock to `now`.
    /// Returns the previous committed rate.
    pub fn set_reward_per_block(&mut self, rate: u128, now: u64) -> u128 {
        let old = self.reward_per_block;
        self.reward_per_block = rate;
        self.emission_updated_at = now;
        old
    }

    /// Move the reward window. The accrual point follows the new start.
    pub fn set_window(&mut self, start_block: u64, end_block: u64) {
        self.start_block = start_block;
        self.end_block = end_block;
        self.last_accrual_block = start_block;
    }

    /// End accrual at `height`.
    pub fn stop_at(&mut self, height: u64) {
        self.end_block = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use silo_core::constants::EMISSION_PERIOD_SECS;

    const P: u128 = 1_000_000_000_000;

    fn acc(rate: u128) -> RewardAccumulator {
        RewardAccumulator::new(P, rate, 100, 1_000, 0, EmissionSchedule::default())
    }

    fn accrued(s: Settlement) -> Accrual {
        match s {
            Settlement::Accrued(a) => a,
            other => panic!("expected accrual, got {other:?}"),
        }
    }

    // --- block_span ---

    #[test]
    fn span_full_inside_window() {
        assert_eq!(block_span(100, 150, 1_000), 50);
        assert_eq!(block_span(100, 1_000, 1_000), 900);
    }

    #[test]
    fn span_partial_across_end() {
        assert_eq!(block_span(990, 1_010, 1_000), 10);
    }

    #[test]
    fn span_zero_past_end() {
        assert_eq!(block_span(1_000, 1_010, 1_000), 0);
        assert_eq!(block_span(1_005, 1_010, 1_000), 0);
    }

    // --- settle ---

    #[test]
    fn settle_before_start_is_noop() {
        let mut a = acc(100);
        assert_eq!(a.settle(0, 50, 10).unwrap(), Settlement::Current);
        assert_eq!(a.last_accrual_block(), 100);
    }

    #[test]
    fn settle_empty_pool_advances_without_accrual() {
        let mut a = acc(100);
        assert_eq!(a.settle(0, 110, 0).unwrap(), Settlement::Idle { from: 100, to: 110 });
        assert_eq!(a.acc_reward_per_share(), 0);
        assert_eq!(a.last_accrual_block(), 110);
    }

    #[test]
    fn settle_spreads_reward_over_stake() {
        let mut a = acc(100);
        let accrual = accrued(a.settle(0, 110, 500).unwrap());
        assert_eq!(accrual.blocks, 10);
        assert_eq!(accrual.reward, 1_000);
        assert_eq!(accrual.dev_reward, 100);
        assert_eq!(accrual.rate_change, None);
        // 1000 reward / 500 staked = 2 per unit
        assert_eq!(a.acc_reward_per_share(), 2 * P);
    }

    #[test]
    fn settle_twice_at_same_height_is_idempotent() {
        let mut a = acc(100);
        a.settle(0, 110, 500).unwrap();
        let before = a.clone();
        assert_eq!(a.settle(0, 110, 500).unwrap(), Settlement::Current);
        assert_eq!(a, before);
    }

    #[test]
    fn settle_stops_at_window_end() {
        let mut a = acc(100);
        let accrual = accrued(a.settle(0, 5_000, 100).unwrap());
        assert_eq!(accrual.blocks, 900);
        assert_eq!(a.last_accrual_block(), 5_000);
        let accrual = accrued(a.settle(0, 6_000, 100).unwrap());
        assert_eq!(accrual.reward, 0);
    }

    #[test]
    fn settle_applies_and_rebases_decay() {
        let mut a = acc(100);
        let now = EMISSION_PERIOD_SECS + 5;
        let accrual = accrued(a.settle(now, 110, 10).unwrap());
        assert_eq!(accrual.rate_change, Some((100, 98)));
        assert_eq!(accrual.reward, 980);
        assert_eq!(a.reward_per_block(), 98);
        assert_eq!(a.emission_updated_at(), now);
    }

    #[test]
    fn idle_settlement_leaves_rate_alone() {
        let mut a = acc(100);
        a.settle(EMISSION_PERIOD_SECS, 110, 0).unwrap();
        assert_eq!(a.reward_per_block(), 100);
        assert_eq!(a.emission_updated_at(), 0);
    }

    #[test]
    fn overflow_leaves_state_untouched() {
        let mut a = RewardAccumulator::new(P, u128::MAX, 100, 1_000, 0, EmissionSchedule::default());
        let before = a.clone();
        assert_eq!(a.settle(0, 110, 1), Err(LedgerError::ArithmeticOverflow));
        assert_eq!(a, before);
    }

    // --- projection ---

    #[test]
    fn projection_matches_settlement() {
        let mut a = acc(100);
        let projected = a.projected_acc(EMISSION_PERIOD_SECS * 2, 333, 777).unwrap();
        a.settle(EMISSION_PERIOD_SECS * 2, 333, 777).unwrap();
        assert_eq!(projected, a.acc_reward_per_share());
    }

    #[test]
    fn projection_of_empty_pool_is_flat() {
        let a = acc(100);
        assert_eq!(a.projected_acc(0, 500, 0).unwrap(), 0);
    }

    // --- admin transitions ---

    #[test]
    fn manual_rate_rebases_clock() {
        let mut a = acc(100);
        assert_eq!(a.set_reward_per_block(40, 77), 100);
        assert_eq!(a.reward_per_block(), 40);
        assert_eq!(a.emission_updated_at(), 77);
    }

    #[test]
    fn window_move_resets_accrual_point() {
        let mut a = acc(100);
        a.set_window(300, 400);
        assert_eq!(a.last_accrual_block(), 300);
        assert!(a.is_active(300));
        assert!(!a.is_active(400));
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn acc_monotonic(
            steps in proptest::collection::vec((1u64..500, 1u128..1_000_000, 0u64..10_000_000), 1..20),
        ) {
            let mut a = acc(1_000_000);
            let (mut height, mut now) = (100u64, 0u64);
            for (dh, staked, dt) in steps {
                height += dh;
                now += dt;
                let before = a.acc_reward_per_share();
                a.settle(now, height, staked).unwrap();
                prop_assert!(a.acc_reward_per_share() >= before);
            }
        }

        #[test]
        fn projection_always_matches(
            height in 0u64..2_000,
            staked in 0u128..1_000_000_000,
            now in 0u64..(EMISSION_PERIOD_SECS * 100),
        ) {
            let mut a = acc(1_000_000);
            let projected = a.projected_acc(now, height, staked).unwrap();
            a.settle(now, height, staked).unwrap();
            prop_assert_eq!(projected, a.acc_reward_per_share());
        }
    }
}

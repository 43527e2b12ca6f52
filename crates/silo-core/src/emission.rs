//! Decaying reward emission.
//!
//! The reward rate drops by [`EMISSION_DECAY_BPS`] (2%) of its base for every
//! whole [`EMISSION_PERIOD_SECS`] (30 day) window since the rate was last
//! rebased. Once the linear decay would consume the entire base, the rate
//! clamps to 2% of the base instead of reaching zero.
//!
//! Example with a base of 100 per block:
//! - 0–29 days: 100
//! - 30–59 days: 98
//! - 60–89 days: 96
//! - 50+ windows: 2 (floor)
//!
//! This module is a pure view. The accumulator commits a new rate and
//! rebases the timestamp when it settles.

use serde::{Deserialize, Serialize};

use crate::constants::{EMISSION_DECAY_BPS, EMISSION_PERIOD_SECS, apply_bps};

/// Why the reward rate changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateChange {
    /// Applied by the accumulator when a decay window elapsed.
    Automatic,
    /// Set through the admin surface.
    Manual,
}

/// Period-based linear decay policy with a floor clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionSchedule {
    /// Length of one decay window in seconds.
    pub period_secs: u64,
    /// Decay per window in basis points of the base rate; also the floor.
    pub decay_bps: u128,
}

impl Default for EmissionSchedule {
    fn default() -> Self {
        Self {
            period_secs: EMISSION_PERIOD_SECS,
            decay_bps: EMISSION_DECAY_BPS,
        }
    }
}

impl EmissionSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whole decay windows between `last_update` and `now`.
    ///
    /// Zero when `now` is not after `last_update`.
    pub fn elapsed_periods(&self, last_update: u64, now: u64) -> u64 {
        if now <= last_update || self.period_secs == 0 {
            return 0;
        }
        (now - last_update) / self.period_secs
    }

    /// Effective reward per block for a rate of `base` last rebased at
    /// `last_update`, observed at `now`.
    ///
    /// # Examples
    ///
    /// ```
    /// use silo_core::emission::EmissionSchedule;
    /// use silo_core::constants::EMISSION_PERIOD_SECS;
    /// let schedule = EmissionSchedule::default();
    /// assert_eq!(schedule.current_rate(1_000, 0, EMISSION_PERIOD_SECS - 1), 1_000);
    /// assert_eq!(schedule.current_rate(1_000, 0, EMISSION_PERIOD_SECS), 980);
    /// ```
    pub fn current_rate(&self, base: u128, last_update: u64, now: u64) -> u128 {
        let periods = self.elapsed_periods(last_update, now);
        if periods == 0 {
            return base;
        }

        let step = apply_bps(base, self.decay_bps);
        let decay = step.saturating_mul(u128::from(periods));
        if base > decay {
            base - decay
        } else {
            step
        }
    }

    /// Timestamp at which the next decay window closes.
    pub fn next_decay_at(&self, last_update: u64) -> u64 {
        last_update.saturating_add(self.period_secs)
    }
}

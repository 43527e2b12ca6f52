//! Pool state and its rollback journal.
//!
//! A mutating ledger call opens a journal with [`PoolState::begin`]. The
//! journal copies the globals up front and records each position the first
//! time it is borrowed mutably. [`PoolState::rollback`] restores exactly
//! those, so a failed call leaves no trace.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use silo_core::address::Address;

use crate::accumulator::RewardAccumulator;
use crate::config::{ReferralSplit, Split};
use crate::position::UserPosition;

/// Observational running totals. Never decrease.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Staked tokens spent on buybacks that delivered output.
    pub total_buyback: u128,
    /// Reward tokens delivered to the burn address by buybacks.
    pub total_bought_back: u128,
    pub total_liquidified: u128,
    pub total_referral_commissions: u128,
}

/// Every pool-wide value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolGlobals {
    pub accumulator: RewardAccumulator,
    /// Always the sum of every position's `amount`.
    pub total_staked: u128,
    pub deposit_fee_bps: u128,
    pub pool_limit_per_user: Option<u128>,
    pub split: Split,
    pub referral_split: ReferralSplit,
    pub fee_address: Address,
    pub dev_address: Address,
    pub burn_address: Address,
    pub swap_deadline_secs: u64,
    pub totals: Totals,
}

/// Serializable copy of the whole ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub globals: PoolGlobals,
    pub positions: BTreeMap<Address, UserPosition>,
}

impl PoolSnapshot {
    /// Sum of every position's stake.
    pub fn staked_sum(&self) -> u128 {
        self.positions.values().map(|p| p.amount).sum()
    }
}

/// Undo data for the call in flight.
#[derive(Debug)]
struct Journal {
    globals: PoolGlobals,
    /// Pre-call value of every touched position; `None` if it did not exist.
    touched: HashMap<Address, Option<UserPosition>>,
}

#[derive(Debug)]
pub(crate) struct PoolState {
    pub(crate) globals: PoolGlobals,
    positions: HashMap<Address, UserPosition>,
    journal: Option<Journal>,
}

impl PoolState {
    pub(crate) fn new(globals: PoolGlobals) -> Self {
        Self {
            globals,
            positions: HashMap::new(),
            journal: None,
        }
    }

    /// Open a journal. Replaces any journal left open.
    pub(crate) fn begin(&mut self) {
        self.journal = Some(Journal {
            globals: self.globals.clone(),
            touched: HashMap::new(),
        });
    }

    /// Keep every change since [`begin`](Self::begin).
    pub(crate) fn commit(&mut self) {
        self.journal = None;
    }

    /// Undo every change since [`begin`](Self::begin). Returns the number of
    /// positions restored.
    pub(crate) fn rollback(&mut self) -> usize {
        let Some(journal) = self.journal.take() else {
            return 0;
        };
        self.globals = journal.globals;
        let restored = journal.touched.len();
        for (who, before) in journal.touched {
            match before {
                Some(pos) => {
                    self.positions.insert(who, pos);
                }
                None => {
                    self.positions.remove(&who);
                }
            }
        }
        restored
    }

    pub(crate) fn position(&self, who: &Address) -> Option<&UserPosition> {
        self.positions.get(who)
    }

    /// Borrow `who`'s position mutably, creating it if absent. The first
    /// borrow inside a journal records the prior value.
    pub(crate) fn position_mut(&mut self, who: &Address) -> &mut UserPosition {
        if let Some(journal) = self.journal.as_mut() {
            journal
                .touched
                .entry(*who)
                .or_insert_with(|| self.positions.get(who).cloned());
        }
        self.positions.entry(*who).or_default()
    }

    pub(crate) fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            globals: self.globals.clone(),
            positions: self.positions.iter().map(|(k, v)| (*k, v.clone())).collect(),
        }
    }
}

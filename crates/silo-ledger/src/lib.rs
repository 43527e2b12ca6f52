//! # silo-ledger — Reward accrual and deposit allocation.
//!
//! All reward math is integer fixed point with checked `u128` arithmetic.
//!
//! - **Reward accumulator**: a lazily advanced reward-per-share ledger,
//!   settled on demand by every entry point, with a decaying per-block rate.
//! - **Deposit allocator**: cascades each deposit into a referral payout,
//!   an auto-liquidity leg, and a buy-back-and-burn leg.
//! - **Pool ledger**: the orchestrator. Serializes entry points behind a
//!   reentrancy guard and rolls state back when any collaborator call fails.

pub mod accumulator;
mod admin;
pub mod allocator;
pub mod config;
pub mod ledger;
pub mod position;
pub mod state;

pub use accumulator::{Accrual, RewardAccumulator, Settlement};
pub use allocator::{AllocationPlan, AllocationReport, DepositAllocator};
pub use config::{PoolConfig, ReferralSplit, Split};
pub use ledger::{AdminCap, BlockContext, Collaborators, EVENT_BUFFER_CAPACITY, PoolLedger};
pub use position::UserPosition;
pub use state::{PoolGlobals, PoolSnapshot, Totals};

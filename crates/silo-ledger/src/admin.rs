//! Admin mutators.
//!
//! Each takes the ledger's [`AdminCap`], validates its arguments before
//! touching state, and runs as one guarded call like any user entry point.

use tracing::info;

use silo_core::address::Address;
use silo_core::emission::RateChange;
use silo_core::error::{ConfigError, LedgerError, StateError};
use silo_core::event::LedgerEvent;
use silo_core::traits::Token;

use crate::config::{ReferralSplit, Split, check_deposit_fee, check_window, require_address};
use crate::ledger::{AdminCap, BlockContext, PoolLedger};

impl PoolLedger {
    /// Set the reward rate. Accrual up to `ctx` is settled at the old rate
    /// and the decay clock restarts at `ctx.timestamp`.
    pub fn update_reward_per_block(
        &self,
        cap: &AdminCap,
        ctx: BlockContext,
        rate: u128,
    ) -> Result<(), LedgerError> {
        self.check_cap(cap)?;
        self.transact("update_reward_per_block", |s| {
            s.settle(ctx)?;
            let old = s.globals().accumulator.set_reward_per_block(rate, ctx.timestamp);
            s.events.push(LedgerEvent::RewardRateUpdated {
                old,
                new: rate,
                reason: RateChange::Manual,
            });
            info!(old, new = rate, "reward rate set");
            Ok(())
        })
    }

    pub fn update_deposit_fee(&self, cap: &AdminCap, bps: u128) -> Result<(), LedgerError> {
        self.check_cap(cap)?;
        check_deposit_fee(bps)?;
        self.transact("update_deposit_fee", |s| {
            s.globals().deposit_fee_bps = bps;
            s.events.push(LedgerEvent::DepositFeeUpdated { bps });
            info!(bps, "deposit fee set");
            Ok(())
        })
    }

    pub fn update_addresses(&self, cap: &AdminCap, fee: Address, dev: Address) -> Result<(), LedgerError> {
        self.check_cap(cap)?;
        require_address(&fee, "fee address")?;
        require_address(&dev, "dev address")?;
        self.transact("update_addresses", |s| {
            let globals = s.globals();
            globals.fee_address = fee;
            globals.dev_address = dev;
            s.events.push(LedgerEvent::AddressesUpdated { fee, dev });
            info!(%fee, %dev, "fee and dev addresses set");
            Ok(())
        })
    }

    /// Replace both allocation splits. Each must sum to 10000 bps.
    pub fn update_allocation(
        &self,
        cap: &AdminCap,
        split: Split,
        referral_split: ReferralSplit,
    ) -> Result<(), LedgerError> {
        self.check_cap(cap)?;
        split.validate()?;
        referral_split.validate()?;
        self.transact("update_allocation", |s| {
            let globals = s.globals();
            globals.split = split;
            globals.referral_split = referral_split;
            s.events.push(LedgerEvent::AllocationUpdated);
            info!(?split, ?referral_split, "allocation set");
            Ok(())
        })
    }

    /// Set or clear the per-user stake ceiling. While a ceiling is active a
    /// replacement must be strictly higher.
    pub fn update_pool_limit(&self, cap: &AdminCap, limit: Option<u128>) -> Result<(), LedgerError> {
        self.check_cap(cap)?;
        self.transact("update_pool_limit", |s| {
            let globals = s.globals();
            if let (Some(new), Some(current)) = (limit, globals.pool_limit_per_user) {
                if new <= current {
                    return Err(ConfigError::LimitNotIncreasing { new, current }.into());
                }
            }
            globals.pool_limit_per_user = limit;
            s.events.push(LedgerEvent::PoolLimitUpdated { limit });
            info!(?limit, "pool limit set");
            Ok(())
        })
    }

    /// Move the reward window. Only before the current window starts, and
    /// only to a window that starts after `ctx.height`.
    pub fn update_window(
        &self,
        cap: &AdminCap,
        ctx: BlockContext,
        start_block: u64,
        end_block: u64,
    ) -> Result<(), LedgerError> {
        self.check_cap(cap)?;
        check_window(start_block, end_block, ctx.height)?;
        self.transact("update_window", |s| {
            let accumulator = &mut s.globals().accumulator;
            let start = accumulator.start_block();
            if ctx.height >= start {
                return Err(StateError::WindowStarted { start }.into());
            }
            accumulator.set_window(start_block, end_block);
            s.events.push(LedgerEvent::WindowUpdated { start_block, end_block });
            info!(start_block, end_block, "reward window moved");
            Ok(())
        })
    }

    /// End accrual at `ctx.height`. Only inside the active window.
    pub fn stop_reward(&self, cap: &AdminCap, ctx: BlockContext) -> Result<(), LedgerError> {
        self.check_cap(cap)?;
        self.transact("stop_reward", |s| {
            let accumulator = &s.globals().accumulator;
            let (start, end) = (accumulator.start_block(), accumulator.end_block());
            if !accumulator.is_active(ctx.height) {
                return Err(StateError::OutsideWindow { height: ctx.height, start, end }.into());
            }
            s.settle(ctx)?;
            s.globals().accumulator.stop_at(ctx.height);
            s.events.push(LedgerEvent::RewardStopped { end_block: ctx.height });
            info!(end_block = ctx.height, "reward stopped");
            Ok(())
        })
    }

    /// Move `amount` of the reward reserve to `to`. Only outside the
    /// active window.
    pub fn emergency_reward_withdraw(
        &self,
        cap: &AdminCap,
        ctx: BlockContext,
        amount: u128,
        to: Address,
    ) -> Result<(), LedgerError> {
        self.check_cap(cap)?;
        require_address(&to, "withdraw recipient")?;
        self.transact("emergency_reward_withdraw", |s| {
            let accumulator = &s.globals().accumulator;
            let (start, end) = (accumulator.start_block(), accumulator.end_block());
            if accumulator.is_active(ctx.height) {
                return Err(StateError::InsideWindow { height: ctx.height, start, end }.into());
            }
            s.collab.reward.transfer(&s.ledger, &to, amount)?;
            s.events.push(LedgerEvent::EmergencyRewardWithdraw { to, amount });
            info!(%to, amount, "reward reserve withdrawn");
            Ok(())
        })
    }
}

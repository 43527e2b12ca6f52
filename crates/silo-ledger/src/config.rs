//! Pool configuration.
//!
//! Provides [`PoolConfig`] with every tunable of a pool. [`PoolConfig::validate`]
//! enforces the configuration rules; the ledger refuses to initialize with
//! a config that fails it, and the admin mutators reuse the same checks.

use serde::{Deserialize, Serialize};

use silo_core::address::Address;
use silo_core::constants::{
    BPS_PRECISION, BURN_ADDRESS, DEFAULT_SWAP_DEADLINE_SECS, MAX_DEPOSIT_FEE_BPS,
};
use silo_core::emission::EmissionSchedule;
use silo_core::error::ConfigError;

/// Allocation of a deposit with no referrer bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub buyback_bps: u128,
    pub liquidity_bps: u128,
}

impl Default for Split {
    fn default() -> Self {
        Self {
            buyback_bps: 9_000,
            liquidity_bps: 1_000,
        }
    }
}

impl Split {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.buyback_bps.saturating_add(self.liquidity_bps);
        if sum != BPS_PRECISION {
            return Err(ConfigError::SplitSum { what: "default", sum });
        }
        Ok(())
    }
}

/// Allocation of a deposit whose depositor has a referrer bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralSplit {
    pub upline_bps: u128,
    pub buyback_bps: u128,
    pub liquidity_bps: u128,
}

impl Default for ReferralSplit {
    fn default() -> Self {
        Self {
            upline_bps: 500,
            buyback_bps: 8_500,
            liquidity_bps: 1_000,
        }
    }
}

impl ReferralSplit {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self
            .upline_bps
            .saturating_add(self.buyback_bps)
            .saturating_add(self.liquidity_bps);
        if sum != BPS_PRECISION {
            return Err(ConfigError::SplitSum { what: "referral", sum });
        }
        Ok(())
    }
}

/// Configuration for a pool instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Reward minted per block before emission decay.
    pub reward_per_block: u128,
    /// First block that accrues reward.
    pub start_block: u64,
    /// Accrual stops at this block.
    pub end_block: u64,
    pub deposit_fee_bps: u128,
    /// Per-user stake ceiling. `None` disables the check.
    pub pool_limit_per_user: Option<u128>,
    pub split: Split,
    pub referral_split: ReferralSplit,
    /// Receives deposit fees.
    pub fee_address: Address,
    /// Receives the extra 10% dev mint on every accrual.
    pub dev_address: Address,
    /// Sink for bought-back reward tokens.
    pub burn_address: Address,
    /// Seconds added to the block timestamp to form swap deadlines.
    pub swap_deadline_secs: u64,
    pub emission: EmissionSchedule,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            reward_per_block: 10_000_000_000_000_000_000,
            start_block: 1,
            end_block: 1 + 30 * 28_800,
            deposit_fee_bps: 0,
            pool_limit_per_user: None,
            split: Split::default(),
            referral_split: ReferralSplit::default(),
            fee_address: Address::ZERO,
            dev_address: Address::ZERO,
            burn_address: BURN_ADDRESS,
            swap_deadline_secs: DEFAULT_SWAP_DEADLINE_SECS,
            emission: EmissionSchedule::default(),
        }
    }
}

/// Reject a zero address where an identity is required.
pub fn require_address(address: &Address, what: &'static str) -> Result<(), ConfigError> {
    if address.is_zero() {
        return Err(ConfigError::ZeroAddress(what));
    }
    Ok(())
}

/// Reject a deposit fee above [`MAX_DEPOSIT_FEE_BPS`].
pub fn check_deposit_fee(bps: u128) -> Result<(), ConfigError> {
    if bps > MAX_DEPOSIT_FEE_BPS {
        return Err(ConfigError::FeeTooHigh { bps, max: MAX_DEPOSIT_FEE_BPS });
    }
    Ok(())
}

/// Reject a reward window that is empty or does not start after `height`.
pub fn check_window(start: u64, end: u64, height: u64) -> Result<(), ConfigError> {
    if start >= end {
        return Err(ConfigError::WindowOrder { start, end });
    }
    if start <= height {
        return Err(ConfigError::StartInPast { start, height });
    }
    Ok(())
}

impl PoolConfig {
    /// Check every rule against the chain at `height`.
    pub fn validate(&self, height: u64) -> Result<(), ConfigError> {
        self.split.validate()?;
        self.referral_split.validate()?;
        check_deposit_fee(self.deposit_fee_bps)?;
        require_address(&self.fee_address, "fee address")?;
        require_address(&self.dev_address, "dev address")?;
        require_address(&self.burn_address, "burn address")?;
        check_window(self.start_block, self.end_block, height)
    }
}

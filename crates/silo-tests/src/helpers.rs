//! Shared fixtures for the integration suites.

use std::sync::Arc;

use silo_core::address::Address;
use silo_core::memory::{FixedRateSwap, MemoryCollector, MemoryToken};
use silo_core::traits::Token;
use silo_ledger::{AdminCap, BlockContext, Collaborators, PoolConfig, PoolLedger, PoolSnapshot};

pub const STAKED_TOKEN: Address = Address::repeat(0x01);
pub const REWARD_TOKEN: Address = Address::repeat(0x02);
pub const ROUTER: Address = Address::repeat(0x03);
pub const COLLECTOR: Address = Address::repeat(0x04);
pub const PAIR: Address = Address::repeat(0x05);
pub const LEDGER: Address = Address::repeat(0x50);
pub const FEE: Address = Address::repeat(0xFE);
pub const DEV: Address = Address::repeat(0xDE);

/// Reward tokens the router holds to pay out swaps.
pub const ROUTER_RESERVE: u128 = 1_000_000_000_000_000_000_000_000_000_000;

/// Staked tokens credited to every funded user.
pub const USER_FUNDS: u128 = 1_000_000_000_000;

/// A depositor identity derived from a seed byte.
pub fn user(seed: u8) -> Address {
    Address::repeat(seed)
}

/// Block context at `height` with the clock at zero.
pub fn ctx(height: u64) -> BlockContext {
    BlockContext::new(height, 0)
}

/// 100 reward per block over `[10, 1000)`, no fee, default splits.
pub fn base_config() -> PoolConfig {
    PoolConfig {
        reward_per_block: 100,
        start_block: 10,
        end_block: 1_000,
        fee_address: FEE,
        dev_address: DEV,
        ..PoolConfig::default()
    }
}

/// A ledger wired to in-memory collaborators, initialized at height 1.
pub struct Harness {
    pub staked: Arc<MemoryToken>,
    pub reward: Arc<MemoryToken>,
    pub router: Arc<FixedRateSwap>,
    pub collector: Arc<MemoryCollector>,
    pub ledger: Arc<PoolLedger>,
    pub cap: AdminCap,
}

impl Harness {
    pub fn new(config: PoolConfig) -> Self {
        Self::build(config, MemoryToken::new(STAKED_TOKEN, 18), |c| c)
    }

    /// Build with a custom staked token, and let `wrap` replace any of the
    /// collaborators before the ledger sees them.
    pub fn build(
        config: PoolConfig,
        staked: MemoryToken,
        wrap: impl FnOnce(Collaborators) -> Collaborators,
    ) -> Self {
        Self::with_tokens(config, staked, MemoryToken::new(REWARD_TOKEN, 18), wrap)
    }

    /// [`Harness::build`] with a custom reward token as well.
    pub fn with_tokens(
        config: PoolConfig,
        staked: MemoryToken,
        reward: MemoryToken,
        wrap: impl FnOnce(Collaborators) -> Collaborators,
    ) -> Self {
        let staked = Arc::new(staked);
        let reward = Arc::new(reward);
        let router = Arc::new(
            FixedRateSwap::new(ROUTER, 1, 1)
                .with_token(staked.clone())
                .with_token(reward.clone()),
        );
        reward
            .credit(&ROUTER, ROUTER_RESERVE)
            .unwrap_or_else(|e| panic!("router reserve: {e}"));
        let collector = Arc::new(MemoryCollector::new(COLLECTOR, PAIR, staked.clone(), reward.clone()));

        let collab = wrap(Collaborators {
            staked: staked.clone(),
            reward: reward.clone(),
            router: router.clone(),
            collector: collector.clone(),
        });
        let (ledger, cap) = PoolLedger::initialize(config, collab, LEDGER, ctx(1))
            .unwrap_or_else(|e| panic!("harness config rejected: {e}"));

        Self {
            staked,
            reward,
            router,
            collector,
            ledger: Arc::new(ledger),
            cap,
        }
    }

    /// Credit `who` with [`USER_FUNDS`] of the staked token.
    pub fn fund(&self, who: &Address) {
        self.staked
            .credit(who, USER_FUNDS)
            .unwrap_or_else(|e| panic!("funding {who}: {e}"));
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.ledger
            .snapshot()
            .unwrap_or_else(|e| panic!("snapshot while idle: {e}"))
    }

    pub fn staked_balance(&self, who: &Address) -> u128 {
        self.staked.balance_of(who)
    }

    pub fn reward_balance(&self, who: &Address) -> u128 {
        self.reward.balance_of(who)
    }
}

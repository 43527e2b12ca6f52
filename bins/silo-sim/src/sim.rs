//! Scripted simulation against in-memory collaborators.
//!
//! A [`SimConfig`] holds the pool configuration, the market setup, and a
//! list of [`Step`]s. [`run`] wires a fresh ledger, replays the steps in
//! order, and returns the final state. A failing step is recorded and the
//! script carries on; the ledger has already rolled it back.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use silo_core::address::Address;
use silo_core::event::LedgerEvent;
use silo_core::memory::{FixedRateSwap, MemoryCollector, MemoryToken};
use silo_core::traits::Token;
use silo_ledger::{BlockContext, Collaborators, PoolConfig, PoolLedger, PoolSnapshot};

/// Environment variable prefix for overrides, e.g. `SILO_POOL__DEPOSIT_FEE_BPS`.
pub const ENV_PREFIX: &str = "SILO";

const STAKED_TOKEN: Address = Address::repeat(0x01);
const REWARD_TOKEN: Address = Address::repeat(0x02);
const ROUTER: Address = Address::repeat(0x03);
const COLLECTOR: Address = Address::repeat(0x04);
const PAIR: Address = Address::repeat(0x05);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Deposit,
    Harvest,
    UpdatePool,
}

/// One scripted call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub height: u64,
    #[serde(default)]
    pub timestamp: u64,
    pub action: Action,
    #[serde(default)]
    pub user: Address,
    #[serde(default)]
    pub amount: u128,
    #[serde(default)]
    pub referrer: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub pool: PoolConfig,
    pub ledger_address: Address,
    pub reward_decimals: u8,
    /// Reward tokens paid per staked token, as `swap_rate_num / swap_rate_den`.
    pub swap_rate_num: u128,
    pub swap_rate_den: u128,
    /// Reward tokens the router starts with.
    pub router_reserve: u128,
    /// Staked tokens credited to each user the first time they appear.
    pub user_balance: u128,
    /// Height the ledger is initialized at.
    pub genesis_height: u64,
    pub steps: Vec<Step>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig {
                fee_address: Address::repeat(0xFE),
                dev_address: Address::repeat(0xDE),
                ..PoolConfig::default()
            },
            ledger_address: Address::repeat(0x50),
            reward_decimals: 18,
            swap_rate_num: 1,
            swap_rate_den: 1,
            router_reserve: u64::MAX as u128,
            user_balance: 1_000_000_000_000_000_000_000,
            genesis_height: 0,
            steps: Vec::new(),
        }
    }
}

/// Default script location: `<config dir>/silo/sim.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("silo")
        .join("sim.toml")
}

/// `SILO_`-prefixed environment overrides, `__` between nested keys.
pub fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Load a script from `path` (format by extension), layered with
/// [`environment`] overrides.
pub fn load(path: &Path) -> Result<SimConfig> {
    load_with(path, environment())
}

/// Load a script from `path`, layered with `env`.
///
/// `config` cannot hand out `u128` values, so the merged tree goes through
/// `serde_json::Value` before it is typed.
pub fn load_with(path: &Path, env: config::Environment) -> Result<SimConfig> {
    let tree: serde_json::Value = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(env)
        .build()
        .and_then(|c| c.try_deserialize())
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_value(tree)
        .with_context(|| format!("invalid simulation config in {}", path.display()))
}

/// A step the ledger rejected.
#[derive(Debug, Clone, Serialize)]
pub struct StepFailure {
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub snapshot: PoolSnapshot,
    pub events: Vec<LedgerEvent>,
    pub failures: Vec<StepFailure>,
    /// Reward tokens held by each user at the end.
    pub reward_balances: Vec<(Address, u128)>,
    pub lp_burned: u128,
}

/// Replay `cfg.steps` against a fresh ledger.
pub fn run(cfg: &SimConfig) -> Result<SimReport> {
    let staked = Arc::new(MemoryToken::new(STAKED_TOKEN, 18));
    let reward = Arc::new(MemoryToken::new(REWARD_TOKEN, cfg.reward_decimals));
    let router = Arc::new(
        FixedRateSwap::new(ROUTER, cfg.swap_rate_num, cfg.swap_rate_den)
            .with_token(staked.clone())
            .with_token(reward.clone()),
    );
    reward
        .credit(&ROUTER, cfg.router_reserve)
        .context("router reserve overflows the reward supply")?;
    let collector = Arc::new(MemoryCollector::new(COLLECTOR, PAIR, staked.clone(), reward.clone()));

    let collab = Collaborators {
        staked: staked.clone(),
        reward: reward.clone(),
        router: router.clone(),
        collector: collector.clone(),
    };
    let genesis = BlockContext::new(cfg.genesis_height, 0);
    let (ledger, _cap) = PoolLedger::initialize(cfg.pool.clone(), collab, cfg.ledger_address, genesis)
        .context("pool rejected configuration")?;

    let mut users = Vec::new();
    let mut seen = HashSet::new();
    let mut failures = Vec::new();
    for (index, step) in cfg.steps.iter().enumerate() {
        if step.action != Action::UpdatePool && seen.insert(step.user) {
            staked
                .credit(&step.user, cfg.user_balance)
                .with_context(|| format!("funding {} overflows the staked supply", step.user))?;
            users.push(step.user);
        }
        router.set_time(step.timestamp);
        let ctx = BlockContext::new(step.height, step.timestamp);

        let result = match step.action {
            Action::Deposit => ledger.deposit(ctx, step.user, step.amount, step.referrer).map(drop),
            Action::Harvest => ledger.harvest(ctx, step.user).map(drop),
            Action::UpdatePool => ledger.update_pool(ctx),
        };
        if let Err(e) = result {
            warn!(index, action = ?step.action, error = %e, "step rejected");
            failures.push(StepFailure { index, error: e.to_string() });
        }
    }

    let snapshot = ledger.snapshot()?;
    info!(
        steps = cfg.steps.len(),
        failed = failures.len(),
        total_staked = snapshot.globals.total_staked,
        "simulation finished"
    );
    Ok(SimReport {
        snapshot,
        events: ledger.take_events(),
        failures,
        reward_balances: users.iter().map(|u| (*u, reward.balance_of(u))).collect(),
        lp_burned: collector.lp_burned(),
    })
}

//! The pool ledger orchestrator.
//!
//! [`PoolLedger`] owns the pool state and drives the collaborators. Every
//! mutating entry point:
//!
//! 1. takes the reentrancy guard, failing with [`StateError::Reentrant`] if
//!    a call is already in flight (including one that called back in from a
//!    collaborator);
//! 2. opens a rollback journal over the state;
//! 3. settles the accumulator before touching any position;
//! 4. commits and publishes its events, or restores the journal on error.
//!
//! Views return [`StateError::Busy`] while a mutating call is in flight
//! rather than observe half-applied state.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use silo_core::address::Address;
use silo_core::constants::{apply_bps, precision_factor};
use silo_core::emission::RateChange;
use silo_core::error::{ConfigError, LedgerError, StateError};
use silo_core::event::LedgerEvent;
use silo_core::traits::{LiquidityCollector, MintableToken, SwapRouter, Token};

use crate::accumulator::{RewardAccumulator, Settlement};
use crate::allocator::{AllocationPlan, AllocationReport, DepositAllocator};
use crate::config::{PoolConfig, require_address};
use crate::position::UserPosition;
use crate::state::{PoolGlobals, PoolSnapshot, PoolState, Totals};

/// Host-supplied notion of "now" for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockContext {
    pub height: u64,
    pub timestamp: u64,
}

impl BlockContext {
    pub fn new(height: u64, timestamp: u64) -> Self {
        Self { height, timestamp }
    }
}

/// External capabilities the ledger drives.
#[derive(Clone)]
pub struct Collaborators {
    /// Token users deposit.
    pub staked: Arc<dyn Token>,
    /// Token users earn; the ledger holds its mint authority.
    pub reward: Arc<dyn MintableToken>,
    pub router: Arc<dyn SwapRouter>,
    pub collector: Arc<dyn LiquidityCollector>,
}

/// Authority over one ledger's admin mutators.
///
/// Issued once by [`PoolLedger::initialize`]. Not `Clone`: whoever holds it
/// is the admin.
#[derive(Debug)]
pub struct AdminCap {
    pub(crate) ledger_id: [u8; 32],
}

/// Clears the busy flag on every exit path.
struct EntryGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Committed events held until [`PoolLedger::take_events`] drains them.
/// Past this, the oldest are dropped.
pub const EVENT_BUFFER_CAPACITY: usize = 4_096;

/// Staking ledger for one pool.
///
/// Events of committed calls accumulate in a bounded buffer; the host is
/// expected to drain it with [`PoolLedger::take_events`].
pub struct PoolLedger {
    id: [u8; 32],
    address: Address,
    collab: Collaborators,
    state: Mutex<PoolState>,
    busy: AtomicBool,
    events: Mutex<VecDeque<LedgerEvent>>,
}

impl PoolLedger {
    /// Create a ledger custodied at `address`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError`] if `config` fails validation at `ctx.height`, the
    ///   reward token has 30 or more decimals, or `address` is zero
    pub fn initialize(
        config: PoolConfig,
        collab: Collaborators,
        address: Address,
        ctx: BlockContext,
    ) -> Result<(Self, AdminCap), LedgerError> {
        require_address(&address, "ledger address")?;
        config.validate(ctx.height)?;
        let decimals = collab.reward.decimals();
        let precision = precision_factor(decimals).ok_or(ConfigError::RewardDecimals(decimals))?;

        let accumulator = RewardAccumulator::new(
            precision,
            config.reward_per_block,
            config.start_block,
            config.end_block,
            ctx.timestamp,
            config.emission,
        );
        let globals = PoolGlobals {
            accumulator,
            total_staked: 0,
            deposit_fee_bps: config.deposit_fee_bps,
            pool_limit_per_user: config.pool_limit_per_user,
            split: config.split,
            referral_split: config.referral_split,
            fee_address: config.fee_address,
            dev_address: config.dev_address,
            burn_address: config.burn_address,
            swap_deadline_secs: config.swap_deadline_secs,
            totals: Totals::default(),
        };

        let id: [u8; 32] = rand::random();
        info!(
            ledger = %address,
            start_block = config.start_block,
            end_block = config.end_block,
            reward_per_block = config.reward_per_block,
            precision,
            "pool initialized"
        );
        let ledger = Self {
            id,
            address,
            collab,
            state: Mutex::new(PoolState::new(globals)),
            busy: AtomicBool::new(false),
            events: Mutex::new(VecDeque::new()),
        };
        Ok((ledger, AdminCap { ledger_id: id }))
    }

    /// The ledger's custody account.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collab
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Deposit `amount` of the staked token on behalf of `who`.
    ///
    /// Settles the accumulator, pays `who`'s pending reward, pulls the
    /// deposit, takes the fee, allocates the remainder and credits it to the
    /// stake. `referrer` binds only on a first binding. Returns the credited
    /// amount.
    ///
    /// # Errors
    ///
    /// - [`StateError::UserLimitExceeded`] if the per-user limit would be passed
    /// - [`StateError::Reentrant`] if another call is in flight
    /// - [`ExternalError`](silo_core::error::ExternalError) from any collaborator,
    ///   after rolling back every state change
    pub fn deposit(
        &self,
        ctx: BlockContext,
        who: Address,
        amount: u128,
        referrer: Option<Address>,
    ) -> Result<u128, LedgerError> {
        self.transact("deposit", |s| s.deposit(ctx, who, amount, referrer))
    }

    /// Pay out `who`'s pending reward without changing the stake. Returns
    /// the amount paid, which is less than owed on a reserve shortfall.
    pub fn harvest(&self, ctx: BlockContext, who: Address) -> Result<u128, LedgerError> {
        self.transact("harvest", |s| {
            s.settle(ctx)?;
            let paid = s.pay_pending(&who)?;
            s.sync_debt(&who)?;
            Ok(paid)
        })
    }

    /// Bring the accumulator up to `ctx` without any user action.
    pub fn update_pool(&self, ctx: BlockContext) -> Result<(), LedgerError> {
        self.transact("update_pool", |s| s.settle(ctx))
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Reward `who` would be owed if the pool settled at `ctx`.
    pub fn pending_reward(&self, ctx: BlockContext, who: &Address) -> Result<u128, LedgerError> {
        let state = self.observe()?;
        let Some(pos) = state.position(who) else {
            return Ok(0);
        };
        let globals = &state.globals;
        let acc = globals
            .accumulator
            .projected_acc(ctx.timestamp, ctx.height, globals.total_staked)?;
        pos.pending(acc, globals.accumulator.precision())
    }

    pub fn position(&self, who: &Address) -> Result<Option<UserPosition>, LedgerError> {
        Ok(self.observe()?.position(who).cloned())
    }

    pub fn totals(&self) -> Result<Totals, LedgerError> {
        Ok(self.observe()?.globals.totals)
    }

    pub fn total_staked(&self) -> Result<u128, LedgerError> {
        Ok(self.observe()?.globals.total_staked)
    }

    /// Effective reward per block at `ctx`, emission decay included.
    pub fn reward_per_block_at(&self, ctx: BlockContext) -> Result<u128, LedgerError> {
        Ok(self.observe()?.globals.accumulator.effective_rate(ctx.timestamp))
    }

    pub fn snapshot(&self) -> Result<PoolSnapshot, LedgerError> {
        Ok(self.observe()?.snapshot())
    }

    /// Drain the events of every call committed so far, oldest first. At
    /// most [`EVENT_BUFFER_CAPACITY`] are retained between drains.
    pub fn take_events(&self) -> Vec<LedgerEvent> {
        self.events.lock().drain(..).collect()
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn enter(&self) -> Result<EntryGuard<'_>, StateError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| StateError::Reentrant)?;
        Ok(EntryGuard { busy: &self.busy })
    }

    fn observe(&self) -> Result<MutexGuard<'_, PoolState>, StateError> {
        if self.busy.load(Ordering::Acquire) {
            return Err(StateError::Busy);
        }
        Ok(self.state.lock())
    }

    pub(crate) fn check_cap(&self, cap: &AdminCap) -> Result<(), StateError> {
        if cap.ledger_id != self.id {
            return Err(StateError::ForeignCapability);
        }
        Ok(())
    }

    fn publish(&self, events: Vec<LedgerEvent>) {
        let mut buffer = self.events.lock();
        buffer.extend(events);
        let excess = buffer.len().saturating_sub(EVENT_BUFFER_CAPACITY);
        if excess > 0 {
            buffer.drain(..excess);
            warn!(dropped = excess, "event buffer full, oldest events dropped");
        }
    }

    /// Run `f` as one all-or-nothing call.
    pub(crate) fn transact<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut Session<'_>) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let _guard = self.enter()?;
        let mut state = self.state.lock();
        state.begin();

        let mut session = Session {
            state: &mut *state,
            collab: &self.collab,
            ledger: self.address,
            events: Vec::new(),
        };
        let result = f(&mut session);
        let events = session.events;

        match result {
            Ok(value) => {
                state.commit();
                self.publish(events);
                Ok(value)
            }
            Err(err) => {
                let restored = state.rollback();
                debug!(op, restored, error = %err, "call rolled back");
                Err(err)
            }
        }
    }
}

/// Mutable view of the ledger for the duration of one call.
pub(crate) struct Session<'a> {
    pub(crate) state: &'a mut PoolState,
    pub(crate) collab: &'a Collaborators,
    pub(crate) ledger: Address,
    pub(crate) events: Vec<LedgerEvent>,
}

impl Session<'_> {
    pub(crate) fn globals(&mut self) -> &mut PoolGlobals {
        &mut self.state.globals
    }

    /// Settle the accumulator at `ctx` and mint what it accrued.
    pub(crate) fn settle(&mut self, ctx: BlockContext) -> Result<(), LedgerError> {
        let total = self.state.globals.total_staked;
        let settlement = self
            .state
            .globals
            .accumulator
            .settle(ctx.timestamp, ctx.height, total)?;
        let Settlement::Accrued(accrual) = settlement else {
            return Ok(());
        };

        if let Some((old, new)) = accrual.rate_change {
            info!(old, new, "reward rate decayed");
            self.events.push(LedgerEvent::RewardRateUpdated {
                old,
                new,
                reason: RateChange::Automatic,
            });
        }
        if accrual.dev_reward > 0 {
            let dev = self.state.globals.dev_address;
            self.collab.reward.mint(&dev, accrual.dev_reward)?;
        }
        if accrual.reward > 0 {
            self.collab.reward.mint(&self.ledger, accrual.reward)?;
        }
        Ok(())
    }

    /// Pay `who` their pending reward out of the ledger's reserve, capped
    /// at what the reserve holds. Returns the amount paid.
    pub(crate) fn pay_pending(&mut self, who: &Address) -> Result<u128, LedgerError> {
        let accumulator = &self.state.globals.accumulator;
        let (acc, precision) = (accumulator.acc_reward_per_share(), accumulator.precision());
        let owed = match self.state.position(who) {
            Some(pos) if pos.amount > 0 => pos.pending(acc, precision)?,
            _ => return Ok(0),
        };
        if owed == 0 {
            return Ok(0);
        }

        let available = self.collab.reward.balance_of(&self.ledger);
        let paid = owed.min(available);
        if paid < owed {
            warn!(user = %who, owed, available, "reward reserve short, paying available balance");
        }
        if paid > 0 {
            self.collab.reward.transfer(&self.ledger, who, paid)?;
        }

        let pos = self.state.position_mut(who);
        pos.total_earned = pos.total_earned.saturating_add(paid);
        self.events.push(LedgerEvent::Harvest { user: *who, owed, paid });
        info!(user = %who, owed, paid, "reward harvested");
        Ok(paid)
    }

    /// Resync `who`'s reward debt against the current accumulator. No-op for
    /// an address without a position.
    pub(crate) fn sync_debt(&mut self, who: &Address) -> Result<(), LedgerError> {
        if self.state.position(who).is_none() {
            return Ok(());
        }
        let accumulator = &self.state.globals.accumulator;
        let (acc, precision) = (accumulator.acc_reward_per_share(), accumulator.precision());
        self.state.position_mut(who).sync_debt(acc, precision)
    }

    fn deposit(
        &mut self,
        ctx: BlockContext,
        who: Address,
        amount: u128,
        referrer: Option<Address>,
    ) -> Result<u128, LedgerError> {
        if let Some(limit) = self.state.globals.pool_limit_per_user {
            let staked = self.state.position(&who).map_or(0, |p| p.amount);
            if amount.checked_add(staked).is_none_or(|total| total > limit) {
                return Err(StateError::UserLimitExceeded { amount, staked, limit }.into());
            }
        }

        self.settle(ctx)?;
        self.pay_pending(&who)?;

        let mut net = 0;
        if amount > 0 {
            net = self.take_deposit(ctx, who, amount, referrer)?;
            let pos = self.state.position_mut(&who);
            pos.amount = pos.amount.checked_add(net).ok_or(LedgerError::ArithmeticOverflow)?;
            let globals = self.globals();
            globals.total_staked = globals
                .total_staked
                .checked_add(net)
                .ok_or(LedgerError::ArithmeticOverflow)?;
        }
        self.sync_debt(&who)?;

        self.events.push(LedgerEvent::Deposit { user: who, net });
        info!(user = %who, amount, net, "deposit credited");
        Ok(net)
    }

    /// Pull `amount` from `who`, take the fee, and allocate the rest.
    /// Returns the post-fee amount.
    fn take_deposit(
        &mut self,
        ctx: BlockContext,
        who: Address,
        amount: u128,
        referrer: Option<Address>,
    ) -> Result<u128, LedgerError> {
        let staked = &self.collab.staked;
        let before = staked.balance_of(&self.ledger);
        staked.transfer(&who, &self.ledger, amount)?;
        let received = staked.balance_of(&self.ledger).saturating_sub(before);

        let fee = apply_bps(received, self.state.globals.deposit_fee_bps);
        if fee > 0 {
            let fee_address = self.state.globals.fee_address;
            staked.transfer(&self.ledger, &fee_address, fee)?;
        }
        let net = received - fee;
        debug!(user = %who, amount, received, fee, "deposit pulled");

        let pos = self.state.position_mut(&who);
        if let Some(bound) = pos.bind_referrer(&who, referrer) {
            info!(user = %who, referrer = %bound, "referrer bound");
            self.events.push(LedgerEvent::ReferrerBound { user: who, referrer: bound });
        }
        let upline = self.state.position(&who).and_then(|p| p.referrer);

        let globals = &self.state.globals;
        let plan = AllocationPlan::compute(net, upline.is_some(), &globals.split, &globals.referral_split);
        let deadline = ctx.timestamp.saturating_add(globals.swap_deadline_secs);
        let report = DepositAllocator::new(self.collab, self.ledger, globals.burn_address, deadline)
            .execute(&plan, upline)?;
        self.record_allocation(who, upline, &report);
        Ok(net)
    }

    fn record_allocation(&mut self, who: Address, upline: Option<Address>, report: &AllocationReport) {
        let totals = &mut self.state.globals.totals;
        totals.total_buyback = totals.total_buyback.saturating_add(report.buyback_spent);
        totals.total_bought_back = totals.total_bought_back.saturating_add(report.bought_back);
        totals.total_liquidified = totals.total_liquidified.saturating_add(report.liquidified);
        totals.total_referral_commissions = totals
            .total_referral_commissions
            .saturating_add(report.upline_paid);

        if let Some(referrer) = upline.filter(|_| report.upline_paid > 0) {
            let pos = self.state.position_mut(&referrer);
            pos.referral_commission_earned = pos.referral_commission_earned.saturating_add(report.upline_paid);
            self.events.push(LedgerEvent::ReferralCommission {
                referrer,
                user: who,
                amount: report.upline_paid,
            });
        }
        if report.liquidified > 0 {
            self.events.push(LedgerEvent::Liquidified {
                amount: report.liquidified,
                lp_burned: report.lp_burned,
            });
        }
        if report.buyback_spent > 0 {
            self.events.push(LedgerEvent::Buyback {
                amount_in: report.buyback_spent,
                bought_back: report.bought_back,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silo_core::error::ExternalError;
    use silo_core::memory::{FixedRateSwap, MemoryCollector, MemoryToken};

    const LEDGER: Address = Address::repeat(0x50);

    struct Fixture {
        staked: Arc<MemoryToken>,
        reward: Arc<MemoryToken>,
        router: Arc<FixedRateSwap>,
        ledger: PoolLedger,
        cap: AdminCap,
    }

    fn alice() -> Address {
        Address::repeat(0xA1)
    }

    fn config() -> PoolConfig {
        PoolConfig {
            reward_per_block: 100,
            start_block: 10,
            end_block: 1_000,
            fee_address: Address::repeat(0xFE),
            dev_address: Address::repeat(0xDE),
            ..PoolConfig::default()
        }
    }

    fn fixture() -> Fixture {
        let staked = Arc::new(MemoryToken::new(Address::repeat(0x01), 18));
        let reward = Arc::new(MemoryToken::new(Address::repeat(0x02), 18));
        let router = Arc::new(
            FixedRateSwap::new(Address::repeat(0x03), 1, 1)
                .with_token(staked.clone())
                .with_token(reward.clone()),
        );
        reward.credit(&router.address(), 1_000_000_000).unwrap();
        let collector = Arc::new(MemoryCollector::new(
            Address::repeat(0x04),
            Address::repeat(0x05),
            staked.clone(),
            reward.clone(),
        ));
        let collab = Collaborators {
            staked: staked.clone(),
            reward: reward.clone(),
            router: router.clone(),
            collector,
        };
        let (ledger, cap) =
            PoolLedger::initialize(config(), collab, LEDGER, BlockContext::new(1, 0)).unwrap();
        staked.credit(&alice(), 1_000_000).unwrap();
        Fixture { staked, reward, router, ledger, cap }
    }

    // --- initialize ---

    #[test]
    fn initialize_rejects_invalid_config() {
        let f = fixture();
        let collab = f.ledger.collaborators().clone();
        let err = PoolLedger::initialize(config(), collab, LEDGER, BlockContext::new(10, 0))
            .err()
            .unwrap();
        assert_eq!(err, LedgerError::Config(ConfigError::StartInPast { start: 10, height: 10 }));
    }

    #[test]
    fn initialize_rejects_wide_reward_decimals() {
        let f = fixture();
        let mut collab = f.ledger.collaborators().clone();
        collab.reward = Arc::new(MemoryToken::new(Address::repeat(0x09), 30));
        let err = PoolLedger::initialize(config(), collab, LEDGER, BlockContext::new(1, 0))
            .err()
            .unwrap();
        assert_eq!(err, LedgerError::Config(ConfigError::RewardDecimals(30)));
    }

    #[test]
    fn initialize_rejects_zero_ledger_address() {
        let f = fixture();
        let collab = f.ledger.collaborators().clone();
        let err = PoolLedger::initialize(config(), collab, Address::ZERO, BlockContext::new(1, 0))
            .err()
            .unwrap();
        assert_eq!(err, LedgerError::Config(ConfigError::ZeroAddress("ledger address")));
    }

    #[test]
    fn capability_is_bound_to_its_ledger() {
        let f = fixture();
        assert_eq!(f.ledger.check_cap(&f.cap), Ok(()));
        let other = fixture();
        assert_eq!(f.ledger.check_cap(&other.cap), Err(StateError::ForeignCapability));
    }

    // --- deposit ---

    #[test]
    fn first_deposit_credits_net_stake() {
        let f = fixture();
        let net = f.ledger.deposit(BlockContext::new(5, 0), alice(), 1_000, None).unwrap();
        assert_eq!(net, 1_000);
        let pos = f.ledger.position(&alice()).unwrap().unwrap();
        assert_eq!(pos.amount, 1_000);
        assert_eq!(pos.reward_debt, 0);
        assert_eq!(f.ledger.total_staked().unwrap(), 1_000);
        assert_eq!(f.staked.balance_of(&alice()), 999_000);
    }

    #[test]
    fn deposit_pays_pending_before_crediting() {
        let f = fixture();
        f.ledger.deposit(BlockContext::new(5, 0), alice(), 1_000, None).unwrap();
        // 10 blocks at 100 per block, alone in the pool
        f.ledger.deposit(BlockContext::new(20, 0), alice(), 1_000, None).unwrap();
        assert_eq!(f.reward.balance_of(&alice()), 1_000);
        let pos = f.ledger.position(&alice()).unwrap().unwrap();
        assert_eq!(pos.total_earned, 1_000);
        assert_eq!(pos.reward_debt, 2_000);
        assert_eq!(f.ledger.pending_reward(BlockContext::new(20, 0), &alice()).unwrap(), 0);
    }

    #[test]
    fn settle_mints_dev_share_on_top() {
        let f = fixture();
        f.ledger.deposit(BlockContext::new(5, 0), alice(), 1_000, None).unwrap();
        f.ledger.update_pool(BlockContext::new(20, 0)).unwrap();
        assert_eq!(f.reward.balance_of(&LEDGER), 1_000);
        assert_eq!(f.reward.balance_of(&Address::repeat(0xDE)), 100);
    }

    #[test]
    fn failed_swap_rolls_everything_back() {
        let f = fixture();
        f.ledger.deposit(BlockContext::new(5, 0), alice(), 1_000, None).unwrap();
        let before = f.ledger.snapshot().unwrap();
        f.ledger.take_events();

        f.router.set_failing(true);
        let err = f.ledger.deposit(BlockContext::new(20, 0), alice(), 500, None).unwrap_err();
        assert!(matches!(err, LedgerError::External(ExternalError::SwapFailed(_))));
        assert_eq!(f.ledger.snapshot().unwrap(), before);
        assert!(f.ledger.take_events().is_empty());
    }

    #[test]
    fn user_limit_rejects_before_settling() {
        let f = fixture();
        f.ledger.update_pool_limit(&f.cap, Some(1_500)).unwrap();
        f.ledger.deposit(BlockContext::new(5, 0), alice(), 1_000, None).unwrap();
        let err = f.ledger.deposit(BlockContext::new(20, 0), alice(), 600, None).unwrap_err();
        assert_eq!(
            err,
            LedgerError::State(StateError::UserLimitExceeded { amount: 600, staked: 1_000, limit: 1_500 })
        );
        let snap = f.ledger.snapshot().unwrap();
        assert_eq!(snap.globals.accumulator.last_accrual_block(), 10);
    }

    // --- harvest ---

    #[test]
    fn harvest_without_position_is_noop() {
        let f = fixture();
        assert_eq!(f.ledger.harvest(BlockContext::new(20, 0), alice()).unwrap(), 0);
        assert_eq!(f.ledger.position(&alice()).unwrap(), None);
    }

    #[test]
    fn harvest_matches_pending_view() {
        let f = fixture();
        f.ledger.deposit(BlockContext::new(5, 0), alice(), 1_000, None).unwrap();
        let ctx = BlockContext::new(47, 0);
        let pending = f.ledger.pending_reward(ctx, &alice()).unwrap();
        assert_eq!(f.ledger.harvest(ctx, alice()).unwrap(), pending);
        assert_eq!(pending, 3_700);
    }

    // --- events ---

    #[test]
    fn events_published_on_commit() {
        let f = fixture();
        f.ledger.deposit(BlockContext::new(5, 0), alice(), 1_000, None).unwrap();
        let events = f.ledger.take_events();
        assert!(events.contains(&LedgerEvent::Deposit { user: alice(), net: 1_000 }));
        assert!(events.iter().any(|e| matches!(e, LedgerEvent::Buyback { .. })));
        assert!(f.ledger.take_events().is_empty());
    }

    #[test]
    fn undrained_events_keep_the_newest() {
        let f = fixture();
        let ctx = BlockContext::new(5, 0);
        for _ in 0..EVENT_BUFFER_CAPACITY + 5 {
            f.ledger.deposit(ctx, alice(), 0, None).unwrap();
        }
        f.ledger.deposit(ctx, alice(), 1_000, None).unwrap();

        let events = f.ledger.take_events();
        assert_eq!(events.len(), EVENT_BUFFER_CAPACITY);
        assert_eq!(events.last(), Some(&LedgerEvent::Deposit { user: alice(), net: 1_000 }));
        assert!(f.ledger.take_events().is_empty());
    }
}

//! In-memory collaborators.
//!
//! [`MemoryToken`], [`FixedRateSwap`], and [`MemoryCollector`] implement the
//! collaborator traits over plain `HashMap` balances. They back the test
//! suites, the benches, and the simulator. Not a market model: the swap
//! trades at a fixed rate and the collector mints one share per paired unit.
//!
//! Each type exposes failure injection so callers can exercise the ledger's
//! abort paths.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::address::Address;
use crate::constants::{BPS_PRECISION, apply_bps};
use crate::error::ExternalError;
use crate::traits::{LiquidityCollector, MintableToken, SwapRouter, Token};

#[derive(Debug, Default)]
struct TokenState {
    balances: HashMap<Address, u128>,
    total_supply: u128,
    failing: bool,
    minting_revoked: bool,
}

/// A fungible token with optional fee-on-transfer.
///
/// The transfer fee is taken from the amount in flight and burned, so the
/// recipient receives `amount - fee`.
#[derive(Debug)]
pub struct MemoryToken {
    address: Address,
    decimals: u8,
    transfer_fee_bps: u128,
    state: Mutex<TokenState>,
}

impl MemoryToken {
    pub fn new(address: Address, decimals: u8) -> Self {
        Self {
            address,
            decimals,
            transfer_fee_bps: 0,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Charge `bps` of every transfer as a burned fee.
    pub fn with_transfer_fee(mut self, bps: u128) -> Self {
        self.transfer_fee_bps = bps.min(BPS_PRECISION);
        self
    }

    /// Credit `amount` to `holder` out of thin air, bypassing mint authority.
    ///
    /// Fails with [`ExternalError::Overflow`] if the supply would exceed
    /// `u128::MAX`; nothing is credited in that case.
    pub fn credit(&self, holder: &Address, amount: u128) -> Result<(), ExternalError> {
        let mut state = self.state.lock();
        state.total_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(ExternalError::Overflow)?;
        let balance = state.balances.entry(*holder).or_default();
        *balance = balance.checked_add(amount).ok_or(ExternalError::Overflow)?;
        Ok(())
    }

    pub fn total_supply(&self) -> u128 {
        self.state.lock().total_supply
    }

    /// Make every subsequent transfer fail.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Withdraw the operator role: every subsequent mint fails.
    pub fn revoke_minting(&self) {
        self.state.lock().minting_revoked = true;
    }
}

impl Token for MemoryToken {
    fn address(&self) -> Address {
        self.address
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn balance_of(&self, holder: &Address) -> u128 {
        self.state.lock().balances.get(holder).copied().unwrap_or(0)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: u128) -> Result<u128, ExternalError> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(ExternalError::TransferFailed(format!("token {} halted", self.address)));
        }
        let have = state.balances.get(from).copied().unwrap_or(0);
        if have < amount {
            return Err(ExternalError::InsufficientBalance { holder: *from, have, need: amount });
        }

        let fee = apply_bps(amount, self.transfer_fee_bps);
        let received = amount - fee;
        state.balances.insert(*from, have - amount);
        let to_balance = state.balances.entry(*to).or_default();
        *to_balance = to_balance.checked_add(received).ok_or(ExternalError::Overflow)?;
        state.total_supply -= fee;
        Ok(received)
    }
}

impl MintableToken for MemoryToken {
    fn mint(&self, to: &Address, amount: u128) -> Result<(), ExternalError> {
        let mut state = self.state.lock();
        if state.minting_revoked {
            return Err(ExternalError::MintRejected(self.address));
        }
        state.total_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(ExternalError::Overflow)?;
        let balance = state.balances.entry(*to).or_default();
        *balance = balance.checked_add(amount).ok_or(ExternalError::Overflow)?;
        Ok(())
    }
}

/// A completed swap, recorded for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRecord {
    pub payer: Address,
    pub amount_in: u128,
    pub token_in: Address,
    pub token_out: Address,
    pub recipient: Address,
    pub amount_out: u128,
    pub deadline: u64,
}

#[derive(Debug, Default)]
struct SwapState {
    now: u64,
    failing: bool,
    zero_output: bool,
    history: Vec<SwapRecord>,
}

/// A router that trades any registered pair at `rate_num / rate_den`,
/// paying out of its own reserve.
#[derive(Debug)]
pub struct FixedRateSwap {
    address: Address,
    tokens: HashMap<Address, Arc<MemoryToken>>,
    rate_num: u128,
    rate_den: u128,
    state: Mutex<SwapState>,
}

impl FixedRateSwap {
    pub fn new(address: Address, rate_num: u128, rate_den: u128) -> Self {
        Self {
            address,
            tokens: HashMap::new(),
            rate_num,
            rate_den: rate_den.max(1),
            state: Mutex::new(SwapState::default()),
        }
    }

    /// Make `token` tradable through this router.
    pub fn with_token(mut self, token: Arc<MemoryToken>) -> Self {
        self.tokens.insert(token.address(), token);
        self
    }

    /// Account holding the router's reserves.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Set the router's notion of the current time for deadline checks.
    pub fn set_time(&self, now: u64) {
        self.state.lock().now = now;
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Accept input but deliver nothing, as a drained pool would.
    pub fn set_zero_output(&self, zero: bool) {
        self.state.lock().zero_output = zero;
    }

    pub fn history(&self) -> Vec<SwapRecord> {
        self.state.lock().history.clone()
    }

    fn token(&self, address: &Address) -> Result<&Arc<MemoryToken>, ExternalError> {
        self.tokens
            .get(address)
            .ok_or_else(|| ExternalError::SwapFailed(format!("unknown token {address}")))
    }
}

impl SwapRouter for FixedRateSwap {
    fn exact_input(
        &self,
        payer: &Address,
        amount_in: u128,
        token_in: &Address,
        token_out: &Address,
        recipient: &Address,
        deadline: u64,
    ) -> Result<u128, ExternalError> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(ExternalError::SwapFailed("router halted".to_string()));
        }
        if state.now > deadline {
            return Err(ExternalError::DeadlineExpired { deadline });
        }

        let input = self.token(token_in)?;
        let output = self.token(token_out)?;

        let received = input.transfer(payer, &self.address, amount_in)?;
        let amount_out = if state.zero_output {
            0
        } else {
            received
                .checked_mul(self.rate_num)
                .ok_or(ExternalError::Overflow)?
                / self.rate_den
        };
        if amount_out > 0 {
            output.transfer(&self.address, recipient, amount_out)?;
        }

        state.history.push(SwapRecord {
            payer: *payer,
            amount_in,
            token_in: *token_in,
            token_out: *token_out,
            recipient: *recipient,
            amount_out,
            deadline,
        });
        Ok(amount_out)
    }
}

#[derive(Debug, Default)]
struct CollectorState {
    lp_burned: u128,
    failing: bool,
}

/// Pairs its balances of two tokens into a pool account and burns the
/// resulting shares (one share per paired unit of the smaller side).
#[derive(Debug)]
pub struct MemoryCollector {
    address: Address,
    pair: Address,
    token_a: Arc<MemoryToken>,
    token_b: Arc<MemoryToken>,
    state: Mutex<CollectorState>,
}

impl MemoryCollector {
    pub fn new(
        address: Address,
        pair: Address,
        token_a: Arc<MemoryToken>,
        token_b: Arc<MemoryToken>,
    ) -> Self {
        Self {
            address,
            pair,
            token_a,
            token_b,
            state: Mutex::new(CollectorState::default()),
        }
    }

    /// Total pool shares burned so far.
    pub fn lp_burned(&self) -> u128 {
        self.state.lock().lp_burned
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }
}

impl LiquidityCollector for MemoryCollector {
    fn address(&self) -> Address {
        self.address
    }

    fn add_liquidity_and_burn(&self) -> Result<u128, ExternalError> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(ExternalError::LiquidityFailed("collector halted".to_string()));
        }

        let a = self.token_a.balance_of(&self.address);
        let b = self.token_b.balance_of(&self.address);
        if a == 0 || b == 0 {
            return Ok(0);
        }

        let paired_a = self.token_a.transfer(&self.address, &self.pair, a)?;
        let paired_b = self.token_b.transfer(&self.address, &self.pair, b)?;
        let shares = paired_a.min(paired_b);
        state.lp_burned = state.lp_burned.checked_add(shares).ok_or(ExternalError::Overflow)?;
        Ok(shares)
    }
}

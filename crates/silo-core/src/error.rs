//! Error types for the Silo ledger.
use thiserror::Error;

use crate::address::Address;

/// Rejected configuration. Checked at the boundary before any state changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{what} split sums to {sum} bps, expected 10000")] SplitSum { what: &'static str, sum: u128 },
    #[error("deposit fee {bps} bps exceeds cap {max}")] FeeTooHigh { bps: u128, max: u128 },
    #[error("zero address for {0}")] ZeroAddress(&'static str),
    #[error("reward token decimals {0} must be below 30")] RewardDecimals(u8),
    #[error("start block {start} not before end block {end}")] WindowOrder { start: u64, end: u64 },
    #[error("start block {start} not after current height {height}")] StartInPast { start: u64, height: u64 },
    #[error("new pool limit {new} must exceed current {current}")] LimitNotIncreasing { new: u128, current: u128 },
}

/// Operation not permitted in the current ledger state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("deposit of {amount} over user limit: staked {staked}, limit {limit}")] UserLimitExceeded { amount: u128, staked: u128, limit: u128 },
    #[error("reward window already started at block {start}")] WindowStarted { start: u64 },
    #[error("height {height} outside active window [{start}, {end})")] OutsideWindow { height: u64, start: u64, end: u64 },
    #[error("height {height} inside active window [{start}, {end})")] InsideWindow { height: u64, start: u64, end: u64 },
    #[error("admin capability does not belong to this ledger")] ForeignCapability,
    #[error("re-entrant call rejected")] Reentrant,
    #[error("ledger busy")] Busy,
}

/// Failure reported by an external collaborator (token, router, collector).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalError {
    #[error("insufficient balance at {holder}: have {have}, need {need}")] InsufficientBalance { holder: Address, have: u128, need: u128 },
    #[error("mint rejected by token {0}")] MintRejected(Address),
    #[error("swap failed: {0}")] SwapFailed(String),
    #[error("swap deadline {deadline} expired")] DeadlineExpired { deadline: u64 },
    #[error("liquidity add failed: {0}")] LiquidityFailed(String),
    #[error("transfer failed: {0}")] TransferFailed(String),
    #[error("value overflow")] Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("missing 0x prefix")] MissingPrefix,
    #[error("invalid length: {0} hex digits")] InvalidLength(usize),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)] Config(#[from] ConfigError),
    #[error(transparent)] State(#[from] StateError),
    #[error(transparent)] External(#[from] ExternalError),
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

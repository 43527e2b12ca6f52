//! Collaborator interfaces consumed by the ledger.
//!
//! The ledger never moves tokens or trades itself; it drives these traits:
//! - [`Token`]: custody of the staked token (and balance reads of the reward token)
//! - [`MintableToken`]: reward-token issuance, held by the ledger as operator
//! - [`SwapRouter`]: exact-input swaps on an external market
//! - [`LiquidityCollector`]: pairs whatever it holds into liquidity and burns the shares
//!
//! All calls are synchronous. A returned error aborts the enclosing ledger
//! operation; nothing is retried.

use crate::address::Address;
use crate::error::ExternalError;

/// A fungible token ledger.
pub trait Token: Send + Sync {
    /// The token's own identity, used to name it in swaps.
    fn address(&self) -> Address;

    fn decimals(&self) -> u8;

    fn balance_of(&self, holder: &Address) -> u128;

    /// Move `amount` from `from` to `to`.
    ///
    /// Returns the amount `to` actually received, which may be less than
    /// `amount` for fee-on-transfer tokens.
    fn transfer(&self, from: &Address, to: &Address, amount: u128) -> Result<u128, ExternalError>;
}

/// A token the ledger may mint.
pub trait MintableToken: Token {
    /// Create `amount` new units credited to `to`.
    fn mint(&self, to: &Address, amount: u128) -> Result<(), ExternalError>;
}

/// Exact-input swap capability.
pub trait SwapRouter: Send + Sync {
    /// Swap `amount_in` of `token_in`, paid by `payer`, into `token_out`
    /// delivered to `recipient`. Fails once `deadline` has passed.
    ///
    /// The returned figure is advisory; callers that need precision measure
    /// the recipient's balance delta instead.
    fn exact_input(
        &self,
        payer: &Address,
        amount_in: u128,
        token_in: &Address,
        token_out: &Address,
        recipient: &Address,
        deadline: u64,
    ) -> Result<u128, ExternalError>;
}

/// Auto-liquidity sink.
pub trait LiquidityCollector: Send + Sync {
    /// Account that receives both halves of a liquidity leg.
    fn address(&self) -> Address;

    /// Pair every balance the collector currently holds and burn the
    /// resulting pool shares. Returns the shares burned.
    fn add_liquidity_and_burn(&self) -> Result<u128, ExternalError>;
}

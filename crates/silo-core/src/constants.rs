//! Protocol constants. Percentages are basis points (1 bps = 0.01%).

use crate::address::Address;

/// Denominator for every basis-point value.
pub const BPS_PRECISION: u128 = 10_000;

/// Fixed-point exponent ceiling. The accumulator precision factor is
/// `10^(MAX_PRECISION_DECIMALS - reward_decimals)`.
pub const MAX_PRECISION_DECIMALS: u8 = 30;

/// Length of one emission decay window: 30 days.
pub const EMISSION_PERIOD_SECS: u64 = 30 * 24 * 3600;

/// Emission reduction per elapsed window, and the floor the rate clamps to.
pub const EMISSION_DECAY_BPS: u128 = 200;

/// The dev fund receives `reward / DEV_MINT_DIVISOR` on top of every accrual.
pub const DEV_MINT_DIVISOR: u128 = 10;

/// Hard cap for the deposit fee: 10%.
pub const MAX_DEPOSIT_FEE_BPS: u128 = 1_000;

/// Default window between a deposit and the deadline handed to the swap router.
pub const DEFAULT_SWAP_DEADLINE_SECS: u64 = 300;

/// Conventional sink for bought-back tokens and burned LP shares.
///
/// # Examples
///
/// ```
/// use silo_core::constants::BURN_ADDRESS;
/// assert_eq!(BURN_ADDRESS.to_string(), "0x000000000000000000000000000000000000dead");
/// ```
pub const BURN_ADDRESS: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xde, 0xad,
]);

/// Precision factor for a reward token with `decimals` decimal places.
///
/// Returns `None` when `decimals >= MAX_PRECISION_DECIMALS`.
///
/// # Examples
///
/// ```
/// use silo_core::constants::precision_factor;
/// assert_eq!(precision_factor(18), Some(1_000_000_000_000));
/// assert_eq!(precision_factor(30), None);
/// ```
pub fn precision_factor(decimals: u8) -> Option<u128> {
    if decimals >= MAX_PRECISION_DECIMALS {
        return None;
    }
    10u128.checked_pow(u32::from(MAX_PRECISION_DECIMALS - decimals))
}

/// `amount * bps / BPS_PRECISION`, rounded down, without overflowing for
/// any `amount` when `bps <= BPS_PRECISION`.
///
/// # Examples
///
/// ```
/// use silo_core::constants::apply_bps;
/// assert_eq!(apply_bps(1_000, 200), 20);
/// assert_eq!(apply_bps(u128::MAX, 10_000), u128::MAX);
/// ```
pub fn apply_bps(amount: u128, bps: u128) -> u128 {
    mul_div_floor(amount, bps.min(BPS_PRECISION), BPS_PRECISION)
}

/// `value * num / den` rounded down, without forming the full product.
///
/// Cannot overflow while `num <= den`. `den` must be non-zero.
///
/// # Examples
///
/// ```
/// use silo_core::constants::mul_div_floor;
/// assert_eq!(mul_div_floor(931, 1_000, 9_500), 98);
/// assert_eq!(mul_div_floor(u128::MAX, 3, 3), u128::MAX);
/// ```
pub fn mul_div_floor(value: u128, num: u128, den: u128) -> u128 {
    (value / den) * num + (value % den) * num / den
}

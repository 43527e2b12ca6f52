//! Ledger notifications.
//!
//! Events are buffered while an operation runs and published only when it
//! commits, so observers never see a rolled-back deposit.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::emission::RateChange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A deposit completed; `net` is the amount credited to the stake.
    Deposit { user: Address, net: u128 },
    /// Pending reward paid out. `owed` differs from `paid` on a reserve shortfall.
    Harvest { user: Address, owed: u128, paid: u128 },
    RewardRateUpdated { old: u128, new: u128, reason: RateChange },
    ReferrerBound { user: Address, referrer: Address },
    ReferralCommission { referrer: Address, user: Address, amount: u128 },
    Buyback { amount_in: u128, bought_back: u128 },
    Liquidified { amount: u128, lp_burned: u128 },
    DepositFeeUpdated { bps: u128 },
    AllocationUpdated,
    PoolLimitUpdated { limit: Option<u128> },
    WindowUpdated { start_block: u64, end_block: u64 },
    RewardStopped { end_block: u64 },
    AddressesUpdated { fee: Address, dev: Address },
    EmergencyRewardWithdraw { to: Address, amount: u128 },
}

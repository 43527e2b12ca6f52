//! Worked deposit scenarios.
//!
//! Each test runs a short script against a fresh ledger and checks the
//! exact figures: credited stake, fee, every allocation leg, the running
//! totals and the events.

use silo_core::constants::{BURN_ADDRESS, EMISSION_PERIOD_SECS};
use silo_core::emission::RateChange;
use silo_core::event::LedgerEvent;
use silo_ledger::{BlockContext, PoolConfig, Totals};
use silo_tests::helpers::*;

fn with_fee(bps: u128) -> PoolConfig {
    PoolConfig { deposit_fee_bps: bps, ..base_config() }
}

// ---------------------------------------------------------------------------
// Accrual
// ---------------------------------------------------------------------------

#[test]
fn empty_pool_advances_without_accruing() {
    let h = Harness::new(base_config());
    h.ledger.update_pool(ctx(20)).unwrap();

    let acc = h.snapshot().globals.accumulator;
    assert_eq!(acc.acc_reward_per_share(), 0);
    assert_eq!(acc.last_accrual_block(), 20);
    assert_eq!(h.reward_balance(&LEDGER), 0);
    assert_eq!(h.reward_balance(&DEV), 0);
}

#[test]
fn stakers_share_in_proportion() {
    let h = Harness::new(base_config());
    let (alice, bob) = (user(0xA1), user(0xB0));
    h.fund(&alice);
    h.fund(&bob);
    h.ledger.deposit(ctx(5), alice, 1_000, None).unwrap();
    h.ledger.deposit(ctx(5), bob, 3_000, None).unwrap();

    // 100 blocks at 100 per block
    assert_eq!(h.ledger.pending_reward(ctx(110), &alice).unwrap(), 2_500);
    assert_eq!(h.ledger.pending_reward(ctx(110), &bob).unwrap(), 7_500);
}

#[test]
fn late_depositor_earns_only_from_entry() {
    let h = Harness::new(base_config());
    let (alice, bob) = (user(0xA1), user(0xB0));
    h.fund(&alice);
    h.fund(&bob);
    h.ledger.deposit(ctx(5), alice, 1_000, None).unwrap();
    h.ledger.deposit(ctx(20), bob, 1_000, None).unwrap();

    // alice alone for 10 blocks, then both for 10
    assert_eq!(h.ledger.pending_reward(ctx(30), &bob).unwrap(), 500);
    assert_eq!(h.ledger.pending_reward(ctx(30), &alice).unwrap(), 1_500);
    assert_eq!(h.reward_balance(&alice), 0);
}

#[test]
fn accrual_stops_at_end_block() {
    let h = Harness::new(base_config());
    let alice = user(0xA1);
    h.fund(&alice);
    h.ledger.deposit(ctx(5), alice, 1_000, None).unwrap();

    let at_end = h.ledger.pending_reward(ctx(1_000), &alice).unwrap();
    assert_eq!(at_end, 99_000);
    assert_eq!(h.ledger.pending_reward(ctx(5_000), &alice).unwrap(), at_end);
}

#[test]
fn dev_mint_is_a_tenth_on_top() {
    let h = Harness::new(base_config());
    let alice = user(0xA1);
    h.fund(&alice);
    h.ledger.deposit(ctx(5), alice, 1_000, None).unwrap();
    h.ledger.update_pool(ctx(60)).unwrap();

    assert_eq!(h.reward_balance(&LEDGER), 5_000);
    assert_eq!(h.reward_balance(&DEV), 500);
}

// ---------------------------------------------------------------------------
// Emission decay
// ---------------------------------------------------------------------------

#[test]
fn one_period_decays_rate_by_two_percent() {
    let h = Harness::new(base_config());
    let alice = user(0xA1);
    h.fund(&alice);
    h.ledger.deposit(ctx(5), alice, 1_000, None).unwrap();
    h.ledger.take_events();

    let later = BlockContext::new(20, EMISSION_PERIOD_SECS);
    h.ledger.update_pool(later).unwrap();

    assert_eq!(
        h.ledger.take_events(),
        vec![LedgerEvent::RewardRateUpdated { old: 100, new: 98, reason: RateChange::Automatic }]
    );
    assert_eq!(h.ledger.reward_per_block_at(later).unwrap(), 98);
    assert_eq!(h.ledger.pending_reward(later, &alice).unwrap(), 980);
    assert_eq!(h.snapshot().globals.accumulator.emission_updated_at(), EMISSION_PERIOD_SECS);
}

#[test]
fn exhausted_decay_clamps_to_floor() {
    let h = Harness::new(base_config());
    let view = |periods: u64| {
        h.ledger
            .reward_per_block_at(BlockContext::new(2, EMISSION_PERIOD_SECS * periods))
            .unwrap()
    };
    assert_eq!(view(0), 100);
    assert_eq!(view(49), 2);
    assert_eq!(view(50), 2);
    assert_eq!(view(500), 2);
}

// ---------------------------------------------------------------------------
// Deposit allocation
// ---------------------------------------------------------------------------

#[test]
fn fee_then_default_split() {
    let h = Harness::new(with_fee(200));
    let alice = user(0xA1);
    h.fund(&alice);

    let net = h.ledger.deposit(ctx(5), alice, 1_000, None).unwrap();

    assert_eq!(net, 980);
    assert_eq!(h.staked_balance(&FEE), 20);
    let pos = h.ledger.position(&alice).unwrap().unwrap();
    assert_eq!(pos.amount, 980);
    assert_eq!(h.ledger.total_staked().unwrap(), 980);

    let swaps: Vec<u128> = h.router.history().iter().map(|s| s.amount_in).collect();
    assert_eq!(swaps, vec![49, 882]);
    assert_eq!(h.staked_balance(&PAIR), 49);
    assert_eq!(h.collector.lp_burned(), 49);
    assert_eq!(h.reward_balance(&BURN_ADDRESS), 882);
    assert_eq!(
        h.ledger.totals().unwrap(),
        Totals {
            total_buyback: 882,
            total_bought_back: 882,
            total_liquidified: 98,
            total_referral_commissions: 0,
        }
    );
    // the credited stake is not backed by custody: allocation spent it all
    assert_eq!(h.staked_balance(&LEDGER), 0);
}

#[test]
fn referral_pays_upline_before_split() {
    let h = Harness::new(with_fee(200));
    let (alice, bob) = (user(0xA1), user(0xB0));
    h.fund(&bob);

    let net = h.ledger.deposit(ctx(5), bob, 1_000, Some(alice)).unwrap();
    assert_eq!(net, 980);

    // 5% of 980 to alice, the remaining 931 split 1000:8500
    assert_eq!(h.staked_balance(&alice), 49);
    assert_eq!(
        h.ledger.take_events(),
        vec![
            LedgerEvent::ReferrerBound { user: bob, referrer: alice },
            LedgerEvent::ReferralCommission { referrer: alice, user: bob, amount: 49 },
            LedgerEvent::Liquidified { amount: 98, lp_burned: 49 },
            LedgerEvent::Buyback { amount_in: 833, bought_back: 833 },
            LedgerEvent::Deposit { user: bob, net: 980 },
        ]
    );

    let upline = h.ledger.position(&alice).unwrap().unwrap();
    assert_eq!(upline.referral_commission_earned, 49);
    assert_eq!(upline.amount, 0);
    assert_eq!(h.ledger.position(&bob).unwrap().unwrap().referrer, Some(alice));
    assert_eq!(h.ledger.totals().unwrap().total_referral_commissions, 49);
    assert_eq!(h.snapshot().staked_sum(), 980);
}

#[test]
fn first_referrer_is_permanent() {
    let h = Harness::new(base_config());
    let (alice, bob, carol) = (user(0xA1), user(0xB0), user(0xC0));
    h.fund(&bob);

    h.ledger.deposit(ctx(5), bob, 1_000, Some(alice)).unwrap();
    h.ledger.deposit(ctx(6), bob, 1_000, Some(carol)).unwrap();

    assert_eq!(h.ledger.position(&bob).unwrap().unwrap().referrer, Some(alice));
    assert_eq!(h.staked_balance(&carol), 0);
    assert_eq!(h.staked_balance(&alice), 100);
}

#[test]
fn self_referral_is_ignored() {
    let h = Harness::new(base_config());
    let alice = user(0xA1);
    h.fund(&alice);

    h.ledger.deposit(ctx(5), alice, 1_000, Some(alice)).unwrap();

    assert_eq!(h.ledger.position(&alice).unwrap().unwrap().referrer, None);
    assert_eq!(h.ledger.totals().unwrap().total_referral_commissions, 0);
}

// ---------------------------------------------------------------------------
// Harvest
// ---------------------------------------------------------------------------

#[test]
fn harvest_pays_and_resets() {
    let h = Harness::new(base_config());
    let alice = user(0xA1);
    h.fund(&alice);
    h.ledger.deposit(ctx(5), alice, 1_000, None).unwrap();

    assert_eq!(h.ledger.harvest(ctx(30), alice).unwrap(), 2_000);
    assert_eq!(h.reward_balance(&alice), 2_000);
    assert_eq!(h.ledger.pending_reward(ctx(30), &alice).unwrap(), 0);
    assert_eq!(h.ledger.harvest(ctx(30), alice).unwrap(), 0);

    let pos = h.ledger.position(&alice).unwrap().unwrap();
    assert_eq!(pos.total_earned, 2_000);
    assert_eq!(pos.amount, 1_000);
}

#[test]
fn zero_deposit_is_a_harvest() {
    let h = Harness::new(base_config());
    let alice = user(0xA1);
    h.fund(&alice);
    h.ledger.deposit(ctx(5), alice, 1_000, None).unwrap();
    h.ledger.take_events();

    assert_eq!(h.ledger.deposit(ctx(15), alice, 0, None).unwrap(), 0);
    assert_eq!(h.reward_balance(&alice), 500);
    assert_eq!(
        h.ledger.take_events(),
        vec![
            LedgerEvent::Harvest { user: alice, owed: 500, paid: 500 },
            LedgerEvent::Deposit { user: alice, net: 0 },
        ]
    );
}

// ---------------------------------------------------------------------------
// Admin lifecycle
// ---------------------------------------------------------------------------

#[test]
fn moved_window_delays_accrual() {
    let h = Harness::new(base_config());
    let alice = user(0xA1);
    h.fund(&alice);
    h.ledger.update_window(&h.cap, ctx(5), 100, 200).unwrap();
    h.ledger.deposit(ctx(5), alice, 1_000, None).unwrap();

    assert_eq!(h.ledger.pending_reward(ctx(99), &alice).unwrap(), 0);
    assert_eq!(h.ledger.pending_reward(ctx(150), &alice).unwrap(), 5_000);
    assert_eq!(h.ledger.pending_reward(ctx(900), &alice).unwrap(), 10_000);
}

#[test]
fn fee_change_applies_to_next_deposit() {
    let h = Harness::new(base_config());
    let alice = user(0xA1);
    h.fund(&alice);
    h.ledger.deposit(ctx(5), alice, 1_000, None).unwrap();
    h.ledger.update_deposit_fee(&h.cap, 1_000).unwrap();
    let net = h.ledger.deposit(ctx(6), alice, 1_000, None).unwrap();

    assert_eq!(net, 900);
    assert_eq!(h.staked_balance(&FEE), 100);
    assert_eq!(h.ledger.position(&alice).unwrap().unwrap().amount, 1_900);
}

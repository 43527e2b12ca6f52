//! Integration test suite for the Silo staking ledger.
//!
//! Drives [`silo_ledger::PoolLedger`] end to end against the in-memory
//! collaborators: worked deposit scenarios, property tests over random call
//! sequences, and adversarial collaborators that fail, re-enter, or run the
//! reward reserve dry.

pub mod helpers;

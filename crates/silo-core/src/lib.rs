//! # silo-core
//! Foundation types, collaborator traits, and emission math for the Silo
//! staking ledger.

pub mod address;
pub mod constants;
pub mod emission;
pub mod error;
pub mod event;
pub mod memory;
pub mod traits;

pub use address::Address;
pub use emission::{EmissionSchedule, RateChange};
pub use event::LedgerEvent;

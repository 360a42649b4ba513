//! Per-user credit ledger.
//!
//! The ledger itself lives in an external document store. This crate defines
//! the capability the worker needs from it and an in-process implementation
//! for local runs and tests.

pub mod error;
pub mod ledger;
pub mod memory;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{CreditLedger, DebitReceipt};
pub use memory::InMemoryLedger;

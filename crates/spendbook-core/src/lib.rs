//! spendbook-core
//!
//! Ledger logic and services for spendbook.
//! Depends on spendbook-domain. No CLI, no terminal I/O, no direct file access.

pub mod error;
pub mod format;
pub mod ids;
pub mod ledger;
pub mod storage;
pub mod summary_service;
pub mod time;
pub mod view;

pub use error::CoreError;
pub use format::*;
pub use ids::IdSequence;
pub use ledger::*;
pub use storage::{ExpenseStore, MemoryStore};
pub use summary_service::*;
pub use time::{Clock, FixedClock, SystemClock};
pub use view::*;

#[cfg(test)]
mod tests;

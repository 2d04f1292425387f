//! spendbook-domain
//!
//! Pure domain models (Expense, Category, month keys and ranges).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod category;
pub mod common;
pub mod expense;
pub mod month;

pub use category::*;
pub use common::*;
pub use expense::*;
pub use month::*;

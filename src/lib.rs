#![doc(test(attr(deny(warnings))))]

//! spendbook is a small personal expense tracker: an append-at-front ledger of
//! expenses grouped by calendar month, persisted as one JSON document, and driven
//! from an interactive shell.

pub mod cli;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("spendbook tracing initialized.");
    });
}

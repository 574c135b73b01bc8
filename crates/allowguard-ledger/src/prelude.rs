//! Prelude module - commonly used types for convenient import.
//!
//! Use `use allowguard_ledger::prelude::*;` to import all essential types.

pub use crate::{BackgroundService, LedgerOptions, PendingLedger, TabNotifier};

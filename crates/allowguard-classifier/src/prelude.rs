//! Prelude module - commonly used types for convenient import.
//!
//! Use `use allowguard_classifier::prelude::*;` to import all essential types.

pub use crate::{BlacklistSet, KnownContracts, PayloadClassifier};

pub use crate::{ApprovalSelector, Calldata, UNLIMITED_THRESHOLD};

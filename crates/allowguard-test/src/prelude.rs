//! Prelude module - commonly used types for convenient import.
//!
//! Use `use allowguard_test::prelude::*;` to import all essential types.

pub use crate::fixtures::{
    BLACKLISTED_CONTRACT, SAFE_CONTRACT, SPENDER, send_transaction_args, sign_typed_data_args,
    test_classifier, unlimited_approve_tx,
};
pub use crate::harness::{GuardHarness, HarnessOptions};
pub use crate::mocks::{MockProvider, MockTransport, ScriptedPrompt};

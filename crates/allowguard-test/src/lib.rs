//! Allowguard Test - Shared test utilities for the allowguard crates.
//!
//! Mock ports, payload fixtures, and an in-process [`GuardHarness`] that
//! wires page, bridge and background together for end-to-end tests.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! allowguard-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use allowguard_bridge::PromptChoice;
//! use allowguard_test::{GuardHarness, MockProvider, SAFE_CONTRACT, send_transaction_args, unlimited_approve_tx};
//!
//! #[tokio::test]
//! async fn test_user_blocks_unlimited_approval() {
//!     let harness = GuardHarness::new(MockProvider::new());
//!     let provider = harness.provider();
//!     let call = tokio::spawn(async move {
//!         provider.request(send_transaction_args(&unlimited_approve_tx(SAFE_CONTRACT))).await
//!     });
//!
//!     harness.prompt().next_shown().await.unwrap();
//!     harness.prompt().choose(PromptChoice::Block);
//!     assert!(call.await.unwrap().is_err());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;

/// Install a test subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

//! Allowguard Classifier - Heuristic risk classification of wallet requests.
//!
//! Classification is pure and synchronous. Two entry points:
//!
//! - [`PayloadClassifier::classify_transaction`] decodes `eth_sendTransaction`
//!   call data and recognises the ERC-20 `approve`/`increaseAllowance` and
//!   ERC-721/1155 `setApprovalForAll` selectors.
//! - [`PayloadClassifier::classify_signature`] inspects `eth_sign` and
//!   EIP-712 typed-data payloads for permit and marketplace-order schemes.
//!
//! Malformed input never produces an error: a field that fails to decode is
//! simply a finding that is not present.
//!
//! # Example
//!
//! ```
//! use allowguard_classifier::prelude::*;
//! use allowguard_core::TransactionParams;
//! use std::sync::Arc;
//!
//! let classifier = PayloadClassifier::new(
//!     Arc::new(BlacklistSet::sample()),
//!     Arc::new(KnownContracts::default()),
//! );
//! let data = format!("0x095ea7b3{:0>64}{}", "2222222222222222222222222222222222222222", "f".repeat(64));
//! let verdict = classifier.classify_transaction(
//!     &TransactionParams::to("0x1111111111111111111111111111111111111111").with_data(data),
//! );
//! assert!(verdict.is_risky);
//! assert!(verdict.is_unlimited_amount);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod address;
mod builder;
pub mod calldata;
mod classifier;
pub mod typed_data;

pub use address::{BlacklistSet, KnownContracts, format_address, parse_address};
pub use calldata::{ApprovalSelector, Calldata, UNLIMITED_THRESHOLD};
pub use classifier::PayloadClassifier;

//! Allowguard Core - Shared types for the wallet request guard.
//!
//! The guard runs in three isolated execution contexts that only talk through
//! messages: the page (where the wallet provider lives), the content bridge,
//! and the background service. This crate holds everything those contexts
//! have to agree on:
//!
//! - The captured request payloads ([`TransactionParams`], [`RawCallPayload`])
//! - The classifier output ([`RiskVerdict`], [`RiskCategory`])
//! - The ledger record ([`PendingRequest`])
//! - One closed message enum per channel ([`message`])
//! - Request identifiers and the error taxonomy
//!
//! # Example
//!
//! ```
//! use allowguard_core::message::PageToBridge;
//! use allowguard_core::{RequestIdGenerator, RequestKind, TransactionParams};
//!
//! let ids = RequestIdGenerator::new();
//! let msg = PageToBridge::TxRequest {
//!     request_id: ids.next_id(RequestKind::Transaction),
//!     transaction: TransactionParams::to("0x1111111111111111111111111111111111111111"),
//! };
//! let json = serde_json::to_value(&msg).unwrap();
//! assert_eq!(json["type"], "TX_REQUEST");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod error;
pub mod message;
pub mod payload;
pub mod pending;
pub mod types;
pub mod verdict;

pub use error::{GuardError, GuardResult, ProviderError, TransportError};
pub use payload::{RawCallPayload, RequestArguments, SignMethod, SignatureRequest, TransactionParams};
pub use pending::PendingRequest;
pub use types::{Decision, RequestId, RequestIdGenerator, RequestKind, TabId};
pub use verdict::{RiskCategory, RiskVerdict, SignatureDetails};

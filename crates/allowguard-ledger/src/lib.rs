//! Allowguard Ledger - Background-context registry of pending decisions.
//!
//! [`PendingLedger`] holds every risky request that is waiting for the user,
//! keyed by a ledger-assigned id. [`BackgroundService`] is the background's
//! message handler: it classifies incoming payloads, registers the risky
//! ones, and resolves them when the user's decision arrives.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use allowguard_core::message::BackgroundToBridge;
//! use allowguard_core::{Decision, RawCallPayload, RiskVerdict, TabId, TransactionParams, TransportError};
//! use allowguard_ledger::{PendingLedger, TabNotifier};
//!
//! struct Tabs;
//! impl TabNotifier for Tabs {
//!     fn notify(&self, _tab: TabId, _msg: BackgroundToBridge) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//! }
//!
//! let ledger = PendingLedger::new(Arc::new(Tabs));
//! let payload = RawCallPayload::Transaction(TransactionParams::to("0xdead000000000000000000000000000000000000"));
//! let id = ledger.register(payload, RiskVerdict::default(), Some(TabId(1)));
//! assert!(ledger.resolve(&id, Decision::Block).is_ok());
//! assert!(ledger.resolve(&id, Decision::Block).is_err());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod ledger;
mod service;

pub use ledger::{LEDGER_ID_PREFIX, LedgerOptions, PendingLedger, TabNotifier};
pub use service::BackgroundService;

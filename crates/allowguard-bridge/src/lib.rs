//! Allowguard Bridge - Content-context relay between page and background.
//!
//! The [`DecisionBridge`] sits between the page (which suspends risky
//! calls) and the background (which owns the pending-request ledger). It
//! forwards each risky request for registration, shows the warning through
//! a [`DecisionPrompt`], and routes the decision back to the page.
//!
//! Two rules shape everything here:
//!
//! - **Fail open.** If the background cannot be reached, the page is told
//!   to proceed rather than being left suspended.
//! - **Answer once.** Each page request is answered exactly once, by
//!   whichever path (local decision, background broadcast, or eviction)
//!   removes its correlation entry first.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bridge;
mod correlation;
mod forwarder;
mod options;
mod ports;

pub use bridge::DecisionBridge;
pub use forwarder::spawn_event_forwarder;
pub use options::{BridgeOptions, DEFAULT_CONFIRMATION_PHRASE, DEFAULT_MAX_PENDING};
pub use ports::{
    BackgroundTransport, ConfirmResponse, Confirmation, DecisionPrompt, PagePort, PromptChoice,
    Warning,
};

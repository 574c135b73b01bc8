//! Allowguard Events - Fire-and-forget diagnostic events.
//!
//! The bridge and the background publish a [`GuardEvent`] at each step of
//! the decision protocol (`TRANSACTION_INTERCEPTED`, `WARNING_DISPLAYED`, ...).
//! Publishing is a non-blocking broadcast: the decision path never waits on
//! a subscriber, and an event with no subscriber is simply dropped.
//!
//! # Example
//!
//! ```rust
//! use allowguard_core::message::GuardEventType;
//! use allowguard_events::{EventBus, GuardEvent};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe();
//!
//! bus.publish(GuardEvent::new(
//!     "bridge",
//!     GuardEventType::WarningDisplayed,
//!     serde_json::json!({ "txId": "tx_1_1700000000000" }),
//! ));
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type, GuardEventType::WarningDisplayed);
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod event;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
pub use event::{EventMetadata, GuardEvent, kind_label};

//! Prelude module - commonly used types for convenient import.
//!
//! Use `use allowguard_bridge::prelude::*;` to import all essential types.

pub use crate::{BridgeOptions, DecisionBridge};

pub use crate::{
    BackgroundTransport, ConfirmResponse, Confirmation, DecisionPrompt, PagePort, PromptChoice,
    Warning,
};

pub use crate::spawn_event_forwarder;

//! Prelude module - commonly used types for convenient import.
//!
//! Use `use allowguard_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{GuardError, GuardResult, ProviderError, TransportError};

// Payloads and verdicts
pub use crate::{
    RawCallPayload, RequestArguments, RiskCategory, RiskVerdict, SignMethod, SignatureDetails,
    SignatureRequest, TransactionParams,
};

// Identifiers and decisions
pub use crate::{Decision, PendingRequest, RequestId, RequestIdGenerator, RequestKind, TabId};

// Wire protocol
pub use crate::message::{
    AckReply, AnalysisAction, AnalysisReply, BackgroundReply, BackgroundToBridge,
    BridgeToBackground, BridgeToPage, GuardEventType, PageToBridge, SignaturePayload,
};

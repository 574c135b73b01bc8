//! Diagnostic event records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use allowguard_core::message::{BridgeToBackground, GuardEventType};
use allowguard_core::{Decision, RequestId, RequestKind};

/// Where and when an event was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Producing component (`"bridge"`, `"background"`, ...).
    pub source: String,
}

impl EventMetadata {
    /// Metadata stamped with the current time.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            source: source.into(),
        }
    }
}

/// One diagnostic event.
///
/// Consumed by the statistics collaborator; nothing in the decision path
/// ever waits on one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardEvent {
    /// Origin metadata.
    pub metadata: EventMetadata,
    /// Event kind.
    pub event_type: GuardEventType,
    /// Free-form details.
    pub details: Value,
}

impl GuardEvent {
    /// Create an event.
    #[must_use]
    pub fn new(source: impl Into<String>, event_type: GuardEventType, details: Value) -> Self {
        Self {
            metadata: EventMetadata::new(source),
            event_type,
            details,
        }
    }

    /// A risky request reached the bridge.
    #[must_use]
    pub fn intercepted(
        source: impl Into<String>,
        kind: RequestKind,
        request_id: &RequestId,
        details: Value,
    ) -> Self {
        let event_type = match kind {
            RequestKind::Transaction => GuardEventType::TransactionIntercepted,
            RequestKind::Signature => GuardEventType::SignatureIntercepted,
        };
        let mut details = details;
        if let Value::Object(map) = &mut details {
            map.insert("requestId".to_owned(), json!(request_id));
        }
        Self::new(source, event_type, details)
    }

    /// The user decided on `tx_id`.
    #[must_use]
    pub fn user_decision(
        source: impl Into<String>,
        tx_id: &RequestId,
        decision: Decision,
        kind: RequestKind,
    ) -> Self {
        Self::new(
            source,
            GuardEventType::UserDecision,
            json!({
                "txId": tx_id,
                "decision": decision.to_string(),
                "type": kind_label(kind),
            }),
        )
    }

    /// The `LOG_EVENT` message that carries this event to the background.
    #[must_use]
    pub fn to_message(&self) -> BridgeToBackground {
        BridgeToBackground::LogEvent {
            event_type: self.event_type,
            details: self.details.clone(),
        }
    }
}

/// Lowercase request kind used in event details.
#[must_use]
pub fn kind_label(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::Transaction => "transaction",
        RequestKind::Signature => "signature",
    }
}

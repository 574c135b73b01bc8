//! Error types shared by every execution context.
//!
//! Decode failures are deliberately absent: the classifier treats them as
//! "finding not present" and never surfaces them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RequestKind;

/// Errors raised by the guard's own plumbing.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The user (or a fallback policy) blocked the request.
    #[error("{kind} blocked by Approval Guard")]
    Blocked {
        /// What kind of request was blocked.
        kind: RequestKind,
    },

    /// A resolution referenced a request id the ledger does not know.
    #[error("unknown request id: {request_id}")]
    UnknownRequest {
        /// The stale or duplicate id.
        request_id: String,
    },
}

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;

/// Failures of the cross-context message transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The receiving context is not running (e.g. the background worker was
    /// suspended or the extension was reloaded).
    #[error("receiving context unavailable: {0}")]
    Unavailable(String),

    /// The channel was closed before a reply arrived.
    #[error("channel closed before a reply arrived")]
    Disconnected,

    /// The reply did not match the request that was sent.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// An EIP-1193 provider error, as seen by the calling page.
///
/// Blocked requests are reported with [`ProviderError::USER_REJECTED`] so
/// that sites handle them exactly like a rejection in the wallet itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ProviderError {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional provider-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ProviderError {
    /// EIP-1193 "user rejected the request".
    pub const USER_REJECTED: i64 = 4001;

    /// Create a provider error.
    #[must_use]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// The error returned to the page when the guard blocks a request.
    #[must_use]
    pub fn blocked(kind: RequestKind) -> Self {
        Self::new(
            Self::USER_REJECTED,
            GuardError::Blocked { kind }.to_string(),
        )
    }

    /// Whether this error is a user rejection (by the wallet or the guard).
    #[must_use]
    pub fn is_user_rejection(&self) -> bool {
        self.code == Self::USER_REJECTED
    }
}

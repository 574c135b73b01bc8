//! Per-request tracing context.

use chrono::{DateTime, Utc};
use std::fmt;

use allowguard_core::{RequestId, RequestKind};

/// The execution context a log line comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionContext {
    /// Page context (provider interceptor).
    Page,
    /// Content bridge.
    Bridge,
    /// Background service (ledger).
    Background,
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page => f.write_str("page"),
            Self::Bridge => f.write_str("bridge"),
            Self::Background => f.write_str("background"),
        }
    }
}

/// Correlates the log lines of one guarded request within a context.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id of the request.
    pub request_id: RequestId,
    /// Transaction or signature.
    pub kind: RequestKind,
    /// Context this instance lives in.
    pub context: ExecutionContext,
    /// JSON-RPC method, when known.
    pub method: Option<String>,
    /// When the context started tracking the request.
    pub started_at: DateTime<Utc>,
}

impl RequestContext {
    /// Start tracking `request_id`.
    #[must_use]
    pub fn new(context: ExecutionContext, kind: RequestKind, request_id: RequestId) -> Self {
        Self {
            request_id,
            kind,
            context,
            method: None,
            started_at: Utc::now(),
        }
    }

    /// Set the method name.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Milliseconds since tracking started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// A span carrying the request's correlation fields.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "guarded_request",
            request_id = %self.request_id,
            kind = %self.kind,
            context = %self.context,
            method = self.method.as_deref(),
        )
    }
}

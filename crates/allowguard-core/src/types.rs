//! Identifiers and small value types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Correlation id for one in-flight request.
///
/// Ids are opaque strings on the wire. Within a process they are produced by
/// a [`RequestIdGenerator`] and are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    /// Wrap an id received from another context.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Which flavour of request is being guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// An `eth_sendTransaction` call.
    Transaction,
    /// A signature request (`eth_sign`, `eth_signTypedData*`).
    Signature,
}

impl RequestKind {
    /// Prefix used for request ids of this kind.
    #[must_use]
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Transaction => "req",
            Self::Signature => "sig",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transaction => write!(f, "Transaction"),
            Self::Signature => write!(f, "Signature"),
        }
    }
}

/// Produces unique request ids: `<prefix>_<counter>_<unix millis>`.
///
/// The counter is strictly increasing for the life of the generator, so two
/// ids from the same generator never collide even within one millisecond.
#[derive(Debug, Default)]
pub struct RequestIdGenerator {
    counter: AtomicU64,
}

impl RequestIdGenerator {
    /// Create a generator starting at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// Allocate the next id for a page-side request.
    #[must_use]
    pub fn next_id(&self, kind: RequestKind) -> RequestId {
        self.next_with_prefix(kind.id_prefix())
    }

    /// Allocate the next id with an arbitrary prefix.
    #[must_use]
    pub fn next_with_prefix(&self, prefix: &str) -> RequestId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        let millis = chrono::Utc::now().timestamp_millis();
        RequestId(format!("{prefix}_{n}_{millis}"))
    }
}

/// Browser tab identifier of the page that originated a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab:{}", self.0)
    }
}

/// Outcome of a guarded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Forward the request to the wallet unchanged.
    Allow,
    /// Reject the request; the wallet never sees it.
    Block,
}

impl Decision {
    /// Whether the request may proceed.
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl From<bool> for Decision {
    fn from(allow: bool) -> Self {
        if allow { Self::Allow } else { Self::Block }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "PROCEED"),
            Self::Block => write!(f, "BLOCK"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_request_ids_are_unique_and_prefixed() {
        let ids = RequestIdGenerator::new();
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let id = ids.next_id(RequestKind::Transaction);
            assert!(id.as_str().starts_with("req_"));
            assert!(seen.insert(id));
        }
        assert!(ids.next_id(RequestKind::Signature).as_str().starts_with("sig_"));
    }

    #[test]
    fn test_request_id_counter_is_monotonic() {
        let ids = RequestIdGenerator::new();
        let first = ids.next_with_prefix("tx");
        let second = ids.next_with_prefix("tx");
        assert!(first.as_str().starts_with("tx_1_"));
        assert!(second.as_str().starts_with("tx_2_"));
    }

    #[test]
    fn test_decision_from_bool() {
        assert!(Decision::from(true).is_allowed());
        assert!(!Decision::from(false).is_allowed());
        assert_eq!(Decision::Block.to_string(), "BLOCK");
    }

    #[test]
    fn test_request_id_is_transparent_on_the_wire() {
        let id = RequestId::from("req_1_1700000000000");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"req_1_1700000000000\""
        );
    }
}

//! The ledger's record of a request awaiting a human decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::RawCallPayload;
use crate::types::{RequestId, TabId};
use crate::verdict::RiskVerdict;

/// One in-flight request awaiting a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    /// Ledger-assigned id (the `txId` on the wire).
    pub request_id: RequestId,
    /// Tab that must be told about the decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_tab_id: Option<TabId>,
    /// The captured request.
    pub payload: RawCallPayload,
    /// Background classification.
    pub verdict: RiskVerdict,
    /// When the request was registered.
    pub created_at: DateTime<Utc>,
}

impl PendingRequest {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        origin_tab_id: Option<TabId>,
        payload: RawCallPayload,
        verdict: RiskVerdict,
    ) -> Self {
        Self {
            request_id,
            origin_tab_id,
            payload,
            verdict,
            created_at: Utc::now(),
        }
    }

    /// Whether the record was created before `cutoff`.
    #[must_use]
    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        self.created_at < cutoff
    }
}

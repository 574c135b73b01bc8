//! Wire protocol between the three execution contexts.
//!
//! Each channel gets its own closed enum, so every receiver matches
//! exhaustively on what it can actually be sent. The serde attributes keep the
//! JSON shape of the extension messages: a `type` tag in
//! `SCREAMING_SNAKE_CASE` and camelCase fields.
//!
//! ```text
//!  page ──PageToBridge──▶ bridge ──BridgeToBackground──▶ background
//!  page ◀─BridgeToPage─── bridge ◀─BackgroundToBridge─── background
//!                                ◀─BackgroundReply────── (request/response)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::TransportError;
use crate::payload::{SignMethod, SignatureRequest, TransactionParams};
use crate::pending::PendingRequest;
use crate::types::{Decision, RequestId};
use crate::verdict::RiskVerdict;

/// Messages posted by the page interceptor on the window channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum PageToBridge {
    /// A risky `eth_sendTransaction` is suspended.
    TxRequest {
        /// Page-side correlation id.
        request_id: RequestId,
        /// The transaction object.
        transaction: TransactionParams,
    },
    /// A risky signature request is suspended.
    SignatureRequest {
        /// Page-side correlation id.
        request_id: RequestId,
        /// Method, params, and the page's verdict.
        signature_request: SignatureRequest,
    },
}

impl PageToBridge {
    /// The page-side correlation id.
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::TxRequest { request_id, .. } | Self::SignatureRequest { request_id, .. } => {
                request_id
            },
        }
    }
}

/// Messages posted by the bridge back into the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum BridgeToPage {
    /// Final answer for a suspended request.
    TxResponse {
        /// Page-side correlation id.
        request_id: RequestId,
        /// Whether the call may be forwarded to the wallet.
        allow: bool,
    },
}

impl BridgeToPage {
    /// Build a response for `request_id`.
    #[must_use]
    pub fn response(request_id: RequestId, decision: Decision) -> Self {
        Self::TxResponse {
            request_id,
            allow: decision.is_allowed(),
        }
    }
}

/// Method and raw params of a signature request, as sent to the background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignaturePayload {
    /// The signing method.
    pub method: SignMethod,
    /// Raw parameters.
    pub params: Value,
}

/// Diagnostic event kinds carried by `LOG_EVENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuardEventType {
    /// A risky transaction reached the bridge.
    TransactionIntercepted,
    /// A risky signature request reached the bridge.
    SignatureIntercepted,
    /// A warning was put in front of the user.
    WarningDisplayed,
    /// The user decided.
    UserDecision,
}

impl fmt::Display for GuardEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TransactionIntercepted => "TRANSACTION_INTERCEPTED",
            Self::SignatureIntercepted => "SIGNATURE_INTERCEPTED",
            Self::WarningDisplayed => "WARNING_DISPLAYED",
            Self::UserDecision => "USER_DECISION",
        };
        f.write_str(name)
    }
}

/// Requests from the bridge to the background service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum BridgeToBackground {
    /// Classify a transaction and register it if risky.
    AnalyzeTransaction {
        /// The transaction object.
        data: TransactionParams,
    },
    /// Classify a signature request and register it if risky.
    AnalyzeSignature {
        /// Method and raw params.
        data: SignaturePayload,
    },
    /// The user decided on a registered request.
    UserDecision {
        /// Ledger id.
        tx_id: RequestId,
        /// Whether to let it through.
        allow: bool,
    },
    /// Diagnostic lookup of a registered request.
    GetPendingTx {
        /// Ledger id.
        tx_id: RequestId,
    },
    /// Fire-and-forget diagnostic event.
    LogEvent {
        /// Event kind.
        event_type: GuardEventType,
        /// Free-form details.
        details: Value,
    },
    /// Liveness probe.
    Ping,
}

/// What the bridge should do after an analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisAction {
    /// Ask the user; the request is registered under `txId`.
    ShowWarning,
    /// Let the request through.
    Allow,
}

/// Reply to `ANALYZE_TRANSACTION` / `ANALYZE_SIGNATURE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReply {
    /// What to do next.
    pub action: AnalysisAction,
    /// Ledger id, present with `SHOW_WARNING`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<RequestId>,
    /// Background verdict, present with `SHOW_WARNING`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<RiskVerdict>,
}

impl AnalysisReply {
    /// Let the request through.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            action: AnalysisAction::Allow,
            tx_id: None,
            analysis: None,
        }
    }

    /// Ask the user about the request registered as `tx_id`.
    #[must_use]
    pub fn show_warning(tx_id: RequestId, analysis: RiskVerdict) -> Self {
        Self {
            action: AnalysisAction::ShowWarning,
            tx_id: Some(tx_id),
            analysis: Some(analysis),
        }
    }
}

/// Reply to `USER_DECISION`, `LOG_EVENT`, and `PING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckReply {
    /// Whether the request had an effect.
    pub success: bool,
}

/// Any reply the background can send.
///
/// Untagged, so each variant keeps the exact JSON shape of the response it
/// models (`GET_PENDING_TX` answers with the record itself or `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackgroundReply {
    /// Reply to an analysis request.
    Analysis(AnalysisReply),
    /// Acknowledgement.
    Ack(AckReply),
    /// Reply to `GET_PENDING_TX`.
    Pending(Option<PendingRequest>),
}

impl BackgroundReply {
    /// Expect an analysis reply.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnexpectedReply`] for any other variant.
    pub fn into_analysis(self) -> Result<AnalysisReply, TransportError> {
        match self {
            Self::Analysis(reply) => Ok(reply),
            other => Err(TransportError::UnexpectedReply(format!(
                "expected analysis reply, got {other:?}"
            ))),
        }
    }

    /// Expect an acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnexpectedReply`] for any other variant.
    pub fn into_ack(self) -> Result<AckReply, TransportError> {
        match self {
            Self::Ack(reply) => Ok(reply),
            other => Err(TransportError::UnexpectedReply(format!(
                "expected acknowledgement, got {other:?}"
            ))),
        }
    }
}

/// Pushes from the background to a tab's bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum BackgroundToBridge {
    /// A registered request has been decided.
    TransactionDecision {
        /// Ledger id.
        tx_id: RequestId,
        /// Whether to let it through.
        allow: bool,
    },
}

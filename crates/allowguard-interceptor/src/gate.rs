//! Suspension of risky calls until the bridge answers.
//!
//! Each risky call gets its own single-shot completion, keyed by a fresh
//! request id. The message handler for `TX_RESPONSE` removes the waiter and
//! completes it; a second response for the same id finds nothing to resolve.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use allowguard_core::message::{BridgeToPage, PageToBridge};
use allowguard_core::{
    Decision, RequestId, RequestIdGenerator, RequestKind, RiskVerdict, SignatureRequest,
    TransactionParams, TransportError,
};

use crate::options::InterceptorOptions;

/// A risky request that needs a human decision.
#[derive(Debug, Clone, PartialEq)]
pub enum GateRequest {
    /// A risky `eth_sendTransaction`.
    Transaction {
        /// The captured transaction.
        transaction: TransactionParams,
        /// Page-side classification.
        verdict: RiskVerdict,
    },
    /// A risky signature request.
    Signature(SignatureRequest),
}

impl GateRequest {
    /// What kind of request this is.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Transaction { .. } => RequestKind::Transaction,
            Self::Signature(_) => RequestKind::Signature,
        }
    }
}

/// Decides risky requests on behalf of the interceptor.
#[async_trait]
pub trait DecisionGate: Send + Sync {
    /// Suspend until a decision for `request` is available.
    ///
    /// Never fails: every failure mode maps onto a [`Decision`].
    async fn decide(&self, request: GateRequest) -> Decision;
}

/// Outbound half of the page ↔ bridge channel (`window.postMessage`).
pub trait PageOutbox: Send + Sync {
    /// Post a message to the bridge. Delivery is fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the bridge cannot be reached.
    fn post(&self, message: PageToBridge) -> Result<(), TransportError>;
}

/// The page-side [`DecisionGate`]: posts the request to the bridge and waits
/// for the matching `TX_RESPONSE`.
pub struct PageDecisionGate {
    outbox: Arc<dyn PageOutbox>,
    ids: RequestIdGenerator,
    waiters: Mutex<HashMap<RequestId, oneshot::Sender<Decision>>>,
    timeout: Option<Duration>,
    timeout_fallback: Decision,
}

impl PageDecisionGate {
    /// Create a gate that waits indefinitely.
    #[must_use]
    pub fn new(outbox: Arc<dyn PageOutbox>) -> Self {
        Self {
            outbox,
            ids: RequestIdGenerator::new(),
            waiters: Mutex::new(HashMap::new()),
            timeout: None,
            timeout_fallback: Decision::Allow,
        }
    }

    /// Create a gate with the wait policy from `options`.
    #[must_use]
    pub fn from_options(outbox: Arc<dyn PageOutbox>, options: &InterceptorOptions) -> Self {
        let gate = Self::new(outbox);
        match options.decision_timeout {
            Some(limit) => gate.with_timeout(limit, options.timeout_fallback),
            None => gate,
        }
    }

    /// Bound the wait; `fallback` applies when it elapses.
    #[must_use]
    pub fn with_timeout(mut self, limit: Duration, fallback: Decision) -> Self {
        self.timeout = Some(limit);
        self.timeout_fallback = fallback;
        self
    }

    /// Handle a message from the bridge.
    ///
    /// Returns `true` if it resolved a waiting call.
    pub fn handle_message(&self, message: BridgeToPage) -> bool {
        match message {
            BridgeToPage::TxResponse { request_id, allow } => {
                self.resolve(&request_id, Decision::from(allow))
            },
        }
    }

    /// Complete the waiter for `request_id`.
    ///
    /// Returns `false` (and does nothing) for unknown or already-resolved ids.
    pub fn resolve(&self, request_id: &RequestId, decision: Decision) -> bool {
        let Some(sender) = self.lock_waiters().remove(request_id) else {
            debug!(%request_id, "response for unknown request id");
            return false;
        };
        if sender.send(decision).is_err() {
            debug!(%request_id, "caller went away before the decision arrived");
        }
        true
    }

    /// Number of calls currently suspended.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock_waiters().len()
    }

    fn lock_waiters(&self) -> MutexGuard<'_, HashMap<RequestId, oneshot::Sender<Decision>>> {
        self.waiters.lock().unwrap_or_else(|e| {
            warn!("decision waiter lock poisoned, recovering");
            e.into_inner()
        })
    }
}

#[async_trait]
impl DecisionGate for PageDecisionGate {
    async fn decide(&self, request: GateRequest) -> Decision {
        let request_id = self.ids.next_id(request.kind());
        let (tx, rx) = oneshot::channel();
        self.lock_waiters().insert(request_id.clone(), tx);
        let _waiter = WaiterGuard {
            gate: self,
            request_id: request_id.clone(),
        };

        let message = match request {
            GateRequest::Transaction { transaction, .. } => PageToBridge::TxRequest {
                request_id: request_id.clone(),
                transaction,
            },
            GateRequest::Signature(signature_request) => PageToBridge::SignatureRequest {
                request_id: request_id.clone(),
                signature_request,
            },
        };

        if let Err(e) = self.outbox.post(message) {
            warn!(%request_id, error = %e, "bridge unreachable, allowing request");
            return Decision::Allow;
        }
        debug!(%request_id, "waiting for decision");

        let outcome = match self.timeout {
            Some(limit) => {
                if let Ok(outcome) = tokio::time::timeout(limit, rx).await {
                    outcome
                } else {
                    info!(
                        %request_id,
                        timeout_ms = limit.as_millis(),
                        fallback = %self.timeout_fallback,
                        "decision timed out"
                    );
                    return self.timeout_fallback;
                }
            },
            None => rx.await,
        };

        outcome.unwrap_or_else(|_| {
            warn!(%request_id, "decision channel closed, allowing request");
            Decision::Allow
        })
    }
}

/// Removes a waiter when its `decide` call ends, including when the caller
/// drops the future before a decision arrives.
struct WaiterGuard<'a> {
    gate: &'a PageDecisionGate,
    request_id: RequestId,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        if self.gate.lock_waiters().remove(&self.request_id).is_some() {
            debug!(request_id = %self.request_id, "waiter dropped without a decision");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct ChannelOutbox(mpsc::UnboundedSender<PageToBridge>);

    impl PageOutbox for ChannelOutbox {
        fn post(&self, message: PageToBridge) -> Result<(), TransportError> {
            self.0.send(message).map_err(|_| TransportError::Disconnected)
        }
    }

    struct DeadOutbox;

    impl PageOutbox for DeadOutbox {
        fn post(&self, _message: PageToBridge) -> Result<(), TransportError> {
            Err(TransportError::Unavailable("no bridge".to_owned()))
        }
    }

    fn tx_request() -> GateRequest {
        GateRequest::Transaction {
            transaction: TransactionParams::to("0xdead000000000000000000000000000000000000"),
            verdict: RiskVerdict::default(),
        }
    }

    fn channel_gate() -> (Arc<PageDecisionGate>, mpsc::UnboundedReceiver<PageToBridge>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(PageDecisionGate::new(Arc::new(ChannelOutbox(tx)))), rx)
    }

    #[tokio::test]
    async fn test_decision_resumes_waiter() {
        let (gate, mut posted) = channel_gate();
        let waiting = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move { gate.decide(tx_request()).await }
        });

        let message = posted.recv().await.unwrap();
        assert!(matches!(message, PageToBridge::TxRequest { .. }));
        let request_id = message.request_id().clone();
        assert!(request_id.as_str().starts_with("req_"));
        assert_eq!(gate.pending_count(), 1);

        assert!(gate.handle_message(BridgeToPage::TxResponse {
            request_id: request_id.clone(),
            allow: false,
        }));
        assert_eq!(waiting.await.unwrap(), Decision::Block);

        // single-shot: a duplicate response resolves nothing
        assert!(!gate.resolve(&request_id, Decision::Allow));
        assert_eq!(gate.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_signature_request_uses_sig_prefix() {
        let (gate, mut posted) = channel_gate();
        let waiting = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move {
                gate.decide(GateRequest::Signature(SignatureRequest {
                    method: allowguard_core::SignMethod::EthSign,
                    params: serde_json::json!([]),
                    verdict: RiskVerdict::default(),
                }))
                .await
            }
        });

        let message = posted.recv().await.unwrap();
        let PageToBridge::SignatureRequest { request_id, .. } = message else {
            panic!("expected SIGNATURE_REQUEST, got {message:?}");
        };
        assert!(request_id.as_str().starts_with("sig_"));
        gate.resolve(&request_id, Decision::Allow);
        assert_eq!(waiting.await.unwrap(), Decision::Allow);
    }

    #[tokio::test]
    async fn test_unreachable_bridge_fails_open() {
        let gate = PageDecisionGate::new(Arc::new(DeadOutbox));
        assert_eq!(gate.decide(tx_request()).await, Decision::Allow);
        assert_eq!(gate.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_applies_fallback() {
        let (tx, _posted) = mpsc::unbounded_channel();
        let gate = PageDecisionGate::new(Arc::new(ChannelOutbox(tx)))
            .with_timeout(Duration::from_millis(20), Decision::Block);

        assert_eq!(gate.decide(tx_request()).await, Decision::Block);
        assert_eq!(gate.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_call_releases_its_waiter() {
        let (gate, mut posted) = channel_gate();
        let abandoned = tokio::time::timeout(Duration::from_millis(20), gate.decide(tx_request())).await;
        assert!(abandoned.is_err());

        let request_id = posted.recv().await.unwrap().request_id().clone();
        assert_eq!(gate.pending_count(), 0);
        assert!(!gate.resolve(&request_id, Decision::Allow));
    }

    #[tokio::test]
    async fn test_overlapping_requests_resolve_out_of_order() {
        let (gate, mut posted) = channel_gate();
        let first = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move { gate.decide(tx_request()).await }
        });
        let first_id = posted.recv().await.unwrap().request_id().clone();
        let second = tokio::spawn({
            let gate = Arc::clone(&gate);
            async move { gate.decide(tx_request()).await }
        });
        let second_id = posted.recv().await.unwrap().request_id().clone();
        assert_ne!(first_id, second_id);

        gate.resolve(&second_id, Decision::Allow);
        assert_eq!(second.await.unwrap(), Decision::Allow);
        assert_eq!(gate.pending_count(), 1);

        gate.resolve(&first_id, Decision::Block);
        assert_eq!(first.await.unwrap(), Decision::Block);
    }

    #[test]
    fn test_unknown_response_is_ignored() {
        let gate = PageDecisionGate::new(Arc::new(DeadOutbox));
        assert!(!gate.handle_message(BridgeToPage::TxResponse {
            request_id: RequestId::from("req_9_0"),
            allow: true,
        }));
    }
}

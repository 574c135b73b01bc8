//! The decision bridge.
//!
//! # Flow
//!
//! 1. The page posts `TX_REQUEST` or `SIGNATURE_REQUEST`.
//! 2. The bridge asks the background to analyze and register it.
//! 3. `ALLOW` (or any transport failure) answers the page with `allow: true`.
//! 4. `SHOW_WARNING` records `txId → requestId` and shows the warning.
//! 5. The user's decision goes to the background as `USER_DECISION` and is
//!    also applied locally. A `TRANSACTION_DECISION` from the background
//!    resolves the same entry and closes any open warning.
//!
//! Whichever path removes the correlation entry first answers the page; the
//! other finds nothing and does nothing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::json;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, warn};

use allowguard_core::message::{
    AnalysisAction, BackgroundReply, BackgroundToBridge, BridgeToBackground, BridgeToPage,
    GuardEventType, PageToBridge, SignaturePayload,
};
use allowguard_core::payload::SEND_TRANSACTION;
use allowguard_core::{Decision, RequestId, RequestKind};
use allowguard_events::{EventBus, GuardEvent, kind_label};
use allowguard_telemetry::{ExecutionContext, RequestContext};

use crate::correlation::CorrelationMap;
use crate::options::BridgeOptions;
use crate::ports::{
    BackgroundTransport, Confirmation, DecisionPrompt, PagePort, PromptChoice, Warning,
};

const SOURCE: &str = "bridge";

/// Relays requests between the page and the background and collects the
/// user's decision.
pub struct DecisionBridge {
    transport: Arc<dyn BackgroundTransport>,
    page: Arc<dyn PagePort>,
    prompt: Arc<dyn DecisionPrompt>,
    events: EventBus,
    options: BridgeOptions,
    correlations: Mutex<CorrelationMap>,
    open_prompts: Mutex<HashMap<RequestId, oneshot::Sender<()>>>,
}

impl DecisionBridge {
    /// Create a bridge.
    #[must_use]
    pub fn new(
        transport: Arc<dyn BackgroundTransport>,
        page: Arc<dyn PagePort>,
        prompt: Arc<dyn DecisionPrompt>,
        events: EventBus,
        options: BridgeOptions,
    ) -> Self {
        let correlations = Mutex::new(CorrelationMap::new(options.max_pending));
        Self {
            transport,
            page,
            prompt,
            events,
            options,
            correlations,
            open_prompts: Mutex::new(HashMap::new()),
        }
    }

    /// The bus diagnostic events are published on.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Number of requests awaiting a decision.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock_correlations().len()
    }

    /// Handle one page message on its own task.
    ///
    /// Requests are independent: a later warning can be answered before an
    /// earlier one.
    pub fn spawn_page_message(self: &Arc<Self>, message: PageToBridge) -> JoinHandle<()> {
        let bridge = Arc::clone(self);
        tokio::spawn(async move { bridge.handle_page_message(message).await })
    }

    /// Handle a page message through to the page's answer.
    ///
    /// Returns once the page has been answered or the warning was closed.
    pub async fn handle_page_message(&self, message: PageToBridge) {
        let (page_request_id, kind, method, request, details) = match message {
            PageToBridge::TxRequest {
                request_id,
                transaction,
            } => {
                let details = json!({ "method": SEND_TRANSACTION, "to": transaction.to });
                (
                    request_id,
                    RequestKind::Transaction,
                    SEND_TRANSACTION,
                    BridgeToBackground::AnalyzeTransaction { data: transaction },
                    details,
                )
            },
            PageToBridge::SignatureRequest {
                request_id,
                signature_request,
            } => {
                let details = json!({
                    "method": signature_request.method,
                    "risks": signature_request.verdict.risk_reasons,
                });
                (
                    request_id,
                    RequestKind::Signature,
                    signature_request.method.as_str(),
                    BridgeToBackground::AnalyzeSignature {
                        data: SignaturePayload {
                            method: signature_request.method,
                            params: signature_request.params,
                        },
                    },
                    details,
                )
            },
        };
        self.events.publish(GuardEvent::intercepted(
            SOURCE,
            kind,
            &page_request_id,
            details,
        ));

        let context = RequestContext::new(ExecutionContext::Bridge, kind, page_request_id)
            .with_method(method);
        self.relay(context.request_id.clone(), kind, request)
            .instrument(context.span())
            .await;
        debug!(
            request_id = %context.request_id,
            elapsed_ms = context.elapsed_ms(),
            "page request settled"
        );
    }

    async fn relay(
        &self,
        page_request_id: RequestId,
        kind: RequestKind,
        request: BridgeToBackground,
    ) {
        debug!("request from page");
        let reply = match self
            .transport
            .send(request)
            .await
            .and_then(BackgroundReply::into_analysis)
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(request_id = %page_request_id, error = %e, "background unreachable, allowing request");
                self.answer_page(&page_request_id, Decision::Allow);
                return;
            },
        };

        let (AnalysisAction::ShowWarning, Some(tx_id)) = (reply.action, reply.tx_id) else {
            debug!(request_id = %page_request_id, "background allowed request");
            self.answer_page(&page_request_id, Decision::Allow);
            return;
        };

        let evicted = self
            .lock_correlations()
            .insert(tx_id.clone(), page_request_id);
        if let Some((evicted_tx, evicted_request)) = evicted {
            warn!(
                tx_id = %evicted_tx,
                max_pending = self.options.max_pending,
                "too many pending requests, blocking the oldest"
            );
            self.answer_page(&evicted_request, Decision::Block);
            self.close_prompt(&evicted_tx);
            self.release_in_background(&evicted_tx).await;
        }

        self.events.publish(GuardEvent::new(
            SOURCE,
            GuardEventType::WarningDisplayed,
            json!({ "txId": tx_id, "type": kind_label(kind) }),
        ));
        self.run_prompt(Warning {
            tx_id,
            kind,
            analysis: reply.analysis.unwrap_or_default(),
        })
        .await;
    }

    /// Handle a message from the background.
    ///
    /// Returns `true` if it resolved a pending request.
    pub fn handle_background_message(&self, message: BackgroundToBridge) -> bool {
        match message {
            BackgroundToBridge::TransactionDecision { tx_id, allow } => {
                if !self.complete(&tx_id, Decision::from(allow)) {
                    debug!(%tx_id, "decision for unknown or resolved request");
                    return false;
                }
                self.close_prompt(&tx_id);
                true
            },
        }
    }

    /// Record the user's decision on `tx_id`.
    ///
    /// The decision is sent to the background and applied locally, so a
    /// lost background round-trip cannot leave the page waiting.
    pub async fn submit_decision(&self, tx_id: &RequestId, kind: RequestKind, decision: Decision) {
        info!(%tx_id, %decision, "user decision");
        self.events
            .publish(GuardEvent::user_decision(SOURCE, tx_id, decision, kind));

        let message = BridgeToBackground::UserDecision {
            tx_id: tx_id.clone(),
            allow: decision.is_allowed(),
        };
        match self.transport.send(message).await {
            Ok(reply) => debug!(%tx_id, ?reply, "background acknowledged decision"),
            Err(e) => warn!(%tx_id, error = %e, "failed to send decision to background"),
        }

        self.complete(tx_id, decision);
    }

    /// Tell the background an evicted request was blocked, so its ledger
    /// entry does not outlive the page's answer.
    async fn release_in_background(&self, tx_id: &RequestId) {
        let message = BridgeToBackground::UserDecision {
            tx_id: tx_id.clone(),
            allow: false,
        };
        if let Err(e) = self.transport.send(message).await {
            warn!(%tx_id, error = %e, "failed to release evicted request in background");
        }
    }

    async fn run_prompt(&self, warning: Warning) {
        let (close_tx, close_rx) = oneshot::channel();
        self.lock_prompts().insert(warning.tx_id.clone(), close_tx);

        // resolved by the background before the warning went up
        if !self.lock_correlations().contains(&warning.tx_id) {
            self.lock_prompts().remove(&warning.tx_id);
            return;
        }

        let decided = tokio::select! {
            decision = self.ask_user(&warning) => Some(decision),
            _ = close_rx => None,
        };
        self.lock_prompts().remove(&warning.tx_id);
        self.prompt.dismiss(&warning.tx_id);

        match decided {
            Some(decision) => {
                self.submit_decision(&warning.tx_id, warning.kind, decision)
                    .await;
            },
            None => debug!(tx_id = %warning.tx_id, "warning closed without a user decision"),
        }
    }

    async fn ask_user(&self, warning: &Warning) -> Decision {
        let confirmation = match warning.kind {
            RequestKind::Transaction => Confirmation::for_transaction(),
            RequestKind::Signature => {
                Confirmation::for_signature(self.options.confirmation_phrase.as_str())
            },
        };
        loop {
            match self.prompt.present(warning).await {
                PromptChoice::Block => return Decision::Block,
                PromptChoice::Proceed => {
                    let response = self.prompt.confirm(&confirmation).await;
                    if confirmation.is_satisfied_by(&response) {
                        return Decision::Allow;
                    }
                    debug!(tx_id = %warning.tx_id, "proceed not confirmed, warning stays up");
                },
            }
        }
    }

    /// Remove the correlation entry and answer the page. Single-shot.
    fn complete(&self, tx_id: &RequestId, decision: Decision) -> bool {
        let Some(page_request_id) = self.lock_correlations().remove(tx_id) else {
            return false;
        };
        self.answer_page(&page_request_id, decision);
        true
    }

    fn answer_page(&self, page_request_id: &RequestId, decision: Decision) {
        let message = BridgeToPage::response(page_request_id.clone(), decision);
        if let Err(e) = self.page.post(message) {
            warn!(request_id = %page_request_id, error = %e, "failed to answer page");
        }
    }

    fn close_prompt(&self, tx_id: &RequestId) {
        let Some(close) = self.lock_prompts().remove(tx_id) else {
            return;
        };
        if close.send(()).is_err() {
            debug!(%tx_id, "warning already closed");
        }
    }

    fn lock_correlations(&self) -> MutexGuard<'_, CorrelationMap> {
        self.correlations.lock().unwrap_or_else(|e| {
            warn!("correlation map lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn lock_prompts(&self) -> MutexGuard<'_, HashMap<RequestId, oneshot::Sender<()>>> {
        self.open_prompts.lock().unwrap_or_else(|e| {
            warn!("open prompt lock poisoned, recovering");
            e.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ConfirmResponse;
    use allowguard_core::message::{AckReply, AnalysisReply};
    use allowguard_core::{RiskVerdict, SignMethod, SignatureRequest, TransactionParams, TransportError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::mpsc;

    struct MockBackground {
        sent: Mutex<Vec<BridgeToBackground>>,
        analysis: Option<AnalysisReply>,
    }

    impl MockBackground {
        fn answering(analysis: AnalysisReply) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                analysis: Some(analysis),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                analysis: None,
            })
        }

        fn decisions(&self) -> Vec<(RequestId, bool)> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter_map(|m| match m {
                    BridgeToBackground::UserDecision { tx_id, allow } => {
                        Some((tx_id.clone(), *allow))
                    },
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl BackgroundTransport for MockBackground {
        async fn send(
            &self,
            message: BridgeToBackground,
        ) -> Result<BackgroundReply, TransportError> {
            let is_analysis = matches!(
                message,
                BridgeToBackground::AnalyzeTransaction { .. }
                    | BridgeToBackground::AnalyzeSignature { .. }
            );
            self.sent.lock().unwrap().push(message);
            if !is_analysis {
                return Ok(BackgroundReply::Ack(AckReply { success: true }));
            }
            self.analysis
                .clone()
                .map(BackgroundReply::Analysis)
                .ok_or_else(|| TransportError::Unavailable("worker stopped".to_owned()))
        }
    }

    #[derive(Default)]
    struct RecordingPage {
        posted: Mutex<Vec<BridgeToPage>>,
    }

    impl RecordingPage {
        fn answers(&self) -> Vec<(RequestId, bool)> {
            self.posted
                .lock()
                .unwrap()
                .iter()
                .map(|BridgeToPage::TxResponse { request_id, allow }| (request_id.clone(), *allow))
                .collect()
        }
    }

    impl PagePort for RecordingPage {
        fn post(&self, message: BridgeToPage) -> Result<(), TransportError> {
            self.posted.lock().unwrap().push(message);
            Ok(())
        }
    }

    /// Plays back scripted choices; with nothing left to play it leaves the
    /// warning up forever.
    struct ScriptedPrompt {
        choices: Mutex<VecDeque<PromptChoice>>,
        confirmations: Mutex<VecDeque<ConfirmResponse>>,
        shown: mpsc::UnboundedSender<RequestId>,
        dismissed: Mutex<Vec<RequestId>>,
    }

    impl ScriptedPrompt {
        fn new(
            choices: Vec<PromptChoice>,
            confirmations: Vec<ConfirmResponse>,
        ) -> (Arc<Self>, mpsc::UnboundedReceiver<RequestId>) {
            let (shown, rx) = mpsc::unbounded_channel();
            let prompt = Arc::new(Self {
                choices: Mutex::new(choices.into()),
                confirmations: Mutex::new(confirmations.into()),
                shown,
                dismissed: Mutex::new(Vec::new()),
            });
            (prompt, rx)
        }
    }

    #[async_trait]
    impl DecisionPrompt for ScriptedPrompt {
        async fn present(&self, warning: &Warning) -> PromptChoice {
            let _ = self.shown.send(warning.tx_id.clone());
            let next = self.choices.lock().unwrap().pop_front();
            match next {
                Some(choice) => choice,
                None => std::future::pending().await,
            }
        }

        async fn confirm(&self, _confirmation: &Confirmation) -> ConfirmResponse {
            self.confirmations
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ConfirmResponse::Declined)
        }

        fn dismiss(&self, tx_id: &RequestId) {
            self.dismissed.lock().unwrap().push(tx_id.clone());
        }
    }

    fn warning_reply(tx_id: &str) -> AnalysisReply {
        AnalysisReply::show_warning(RequestId::from(tx_id), RiskVerdict::default())
    }

    fn tx_request(id: &str) -> PageToBridge {
        PageToBridge::TxRequest {
            request_id: RequestId::from(id),
            transaction: TransactionParams::to("0xdead000000000000000000000000000000000000"),
        }
    }

    fn bridge(
        background: &Arc<MockBackground>,
        prompt: &Arc<ScriptedPrompt>,
        options: BridgeOptions,
    ) -> (Arc<DecisionBridge>, Arc<RecordingPage>) {
        let page = Arc::new(RecordingPage::default());
        let bridge = Arc::new(DecisionBridge::new(
            Arc::clone(background) as Arc<dyn BackgroundTransport>,
            Arc::clone(&page) as Arc<dyn PagePort>,
            Arc::clone(prompt) as Arc<dyn DecisionPrompt>,
            EventBus::new(),
            options,
        ));
        (bridge, page)
    }

    #[tokio::test]
    async fn test_transport_failure_fails_open() {
        let background = MockBackground::unreachable();
        let (prompt, _shown) = ScriptedPrompt::new(vec![], vec![]);
        let (bridge, page) = bridge(&background, &prompt, BridgeOptions::default());

        bridge.handle_page_message(tx_request("req_1_0")).await;
        assert_eq!(page.answers(), vec![(RequestId::from("req_1_0"), true)]);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_background_allow_answers_page() {
        let background = MockBackground::answering(AnalysisReply::allow());
        let (prompt, _shown) = ScriptedPrompt::new(vec![], vec![]);
        let (bridge, page) = bridge(&background, &prompt, BridgeOptions::default());

        bridge.handle_page_message(tx_request("req_1_0")).await;
        assert_eq!(page.answers(), vec![(RequestId::from("req_1_0"), true)]);
    }

    #[tokio::test]
    async fn test_block_choice_blocks_and_notifies_background() {
        let background = MockBackground::answering(warning_reply("tx_1_0"));
        let (prompt, _shown) = ScriptedPrompt::new(vec![PromptChoice::Block], vec![]);
        let (bridge, page) = bridge(&background, &prompt, BridgeOptions::default());

        bridge.handle_page_message(tx_request("req_1_0")).await;

        assert_eq!(page.answers(), vec![(RequestId::from("req_1_0"), false)]);
        assert_eq!(background.decisions(), vec![(RequestId::from("tx_1_0"), false)]);
        assert_eq!(prompt.dismissed.lock().unwrap().as_slice(), &[RequestId::from("tx_1_0")]);
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_proceed_requires_confirmation() {
        let background = MockBackground::answering(warning_reply("tx_1_0"));
        let (prompt, _shown) = ScriptedPrompt::new(
            vec![PromptChoice::Proceed, PromptChoice::Proceed],
            vec![ConfirmResponse::Declined, ConfirmResponse::Accepted],
        );
        let (bridge, page) = bridge(&background, &prompt, BridgeOptions::default());

        bridge.handle_page_message(tx_request("req_1_0")).await;
        assert_eq!(page.answers(), vec![(RequestId::from("req_1_0"), true)]);
        assert!(prompt.choices.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_signature_needs_exact_phrase() {
        let background = MockBackground::answering(warning_reply("tx_2_0"));
        let (prompt, _shown) = ScriptedPrompt::new(
            vec![PromptChoice::Proceed, PromptChoice::Proceed],
            vec![
                ConfirmResponse::Typed("i understand".to_owned()),
                ConfirmResponse::Typed("I UNDERSTAND THE RISK".to_owned()),
            ],
        );
        let (bridge, page) = bridge(&background, &prompt, BridgeOptions::default());

        bridge
            .handle_page_message(PageToBridge::SignatureRequest {
                request_id: RequestId::from("sig_1_0"),
                signature_request: SignatureRequest {
                    method: SignMethod::EthSign,
                    params: json!(["0xabc", "0x00"]),
                    verdict: RiskVerdict::default(),
                },
            })
            .await;

        assert_eq!(page.answers(), vec![(RequestId::from("sig_1_0"), true)]);
        let sent = background.sent.lock().unwrap();
        assert!(matches!(
            &sent[0],
            BridgeToBackground::AnalyzeSignature { data } if data.method == SignMethod::EthSign
        ));
    }

    #[tokio::test]
    async fn test_background_decision_closes_open_warning() {
        let background = MockBackground::answering(warning_reply("tx_1_0"));
        let (prompt, mut shown) = ScriptedPrompt::new(vec![], vec![]);
        let (bridge, page) = bridge(&background, &prompt, BridgeOptions::default());

        let task = bridge.spawn_page_message(tx_request("req_1_0"));
        assert_eq!(shown.recv().await.unwrap(), RequestId::from("tx_1_0"));

        assert!(bridge.handle_background_message(BackgroundToBridge::TransactionDecision {
            tx_id: RequestId::from("tx_1_0"),
            allow: true,
        }));
        task.await.unwrap();

        assert_eq!(page.answers(), vec![(RequestId::from("req_1_0"), true)]);
        assert!(background.decisions().is_empty());
        assert_eq!(prompt.dismissed.lock().unwrap().len(), 1);

        // duplicate broadcast is a no-op
        assert!(!bridge.handle_background_message(BackgroundToBridge::TransactionDecision {
            tx_id: RequestId::from("tx_1_0"),
            allow: false,
        }));
        assert_eq!(page.answers().len(), 1);
    }

    #[tokio::test]
    async fn test_full_map_blocks_oldest_request() {
        struct CountingBackground {
            next: Mutex<u32>,
            released: Mutex<Vec<(RequestId, bool)>>,
        }

        #[async_trait]
        impl BackgroundTransport for CountingBackground {
            async fn send(
                &self,
                message: BridgeToBackground,
            ) -> Result<BackgroundReply, TransportError> {
                if let BridgeToBackground::UserDecision { tx_id, allow } = message {
                    self.released.lock().unwrap().push((tx_id, allow));
                    return Ok(BackgroundReply::Ack(AckReply { success: true }));
                }
                let mut next = self.next.lock().unwrap();
                *next = next.saturating_add(1);
                Ok(BackgroundReply::Analysis(warning_reply(&format!("tx_{next}_0"))))
            }
        }

        let (prompt, mut shown) = ScriptedPrompt::new(vec![], vec![]);
        let page = Arc::new(RecordingPage::default());
        let background = Arc::new(CountingBackground {
            next: Mutex::new(0),
            released: Mutex::new(Vec::new()),
        });
        let bridge = Arc::new(DecisionBridge::new(
            Arc::clone(&background) as Arc<dyn BackgroundTransport>,
            Arc::clone(&page) as Arc<dyn PagePort>,
            Arc::clone(&prompt) as Arc<dyn DecisionPrompt>,
            EventBus::new(),
            BridgeOptions::default().with_max_pending(1),
        ));

        let first = bridge.spawn_page_message(tx_request("req_1_0"));
        shown.recv().await.unwrap();
        let _second = bridge.spawn_page_message(tx_request("req_2_0"));
        shown.recv().await.unwrap();

        first.await.unwrap();
        assert_eq!(page.answers(), vec![(RequestId::from("req_1_0"), false)]);
        assert_eq!(bridge.pending_count(), 1);
        // the background is told to drop the evicted entry
        assert_eq!(
            background.released.lock().unwrap().as_slice(),
            &[(RequestId::from("tx_1_0"), false)]
        );
    }

    #[tokio::test]
    async fn test_events_published_in_order() {
        let background = MockBackground::answering(warning_reply("tx_1_0"));
        let (prompt, _shown) = ScriptedPrompt::new(vec![PromptChoice::Block], vec![]);
        let (bridge, _page) = bridge(&background, &prompt, BridgeOptions::default());
        let mut events = bridge.events().subscribe();

        bridge.handle_page_message(tx_request("req_1_0")).await;

        let mut seen = Vec::new();
        while let Some(event) = events.try_recv() {
            seen.push(event.event_type);
        }
        assert_eq!(
            seen,
            vec![
                GuardEventType::TransactionIntercepted,
                GuardEventType::WarningDisplayed,
                GuardEventType::UserDecision,
            ]
        );
    }
}

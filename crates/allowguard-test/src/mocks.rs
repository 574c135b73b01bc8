//! Mock implementations of the guard's ports.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::{Notify, mpsc};

use allowguard_bridge::{
    BackgroundTransport, ConfirmResponse, Confirmation, DecisionPrompt, PagePort, PromptChoice,
    Warning,
};
use allowguard_core::message::{
    BackgroundReply, BackgroundToBridge, BridgeToBackground, BridgeToPage, PageToBridge,
};
use allowguard_core::{ProviderError, RequestArguments, RequestId, TabId, TransportError};
use allowguard_interceptor::{PageOutbox, Provider};
use allowguard_ledger::TabNotifier;

/// A wallet provider that records requests and replies from a script.
///
/// Without a scripted reply every request succeeds with a fake
/// transaction hash.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<Result<Value, ProviderError>>>>,
    requests: Arc<Mutex<Vec<RequestArguments>>>,
}

impl MockProvider {
    /// Create a provider with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    #[must_use]
    pub fn with_reply(self, value: Value) -> Self {
        if let Ok(mut guard) = self.replies.lock() {
            guard.push_back(Ok(value));
        }
        self
    }

    /// Queue an error reply.
    #[must_use]
    pub fn with_error(self, error: ProviderError) -> Self {
        if let Ok(mut guard) = self.replies.lock() {
            guard.push_back(Err(error));
        }
        self
    }

    /// Every request that reached this provider, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RequestArguments> {
        self.requests.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Methods of every request that reached this provider.
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.method).collect()
    }

    /// Number of requests received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|g| g.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn request(&self, args: RequestArguments) -> Result<Value, ProviderError> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(args);
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut g| g.pop_front())
            .unwrap_or_else(|| Ok(json!("0xfeedface")))
    }
}

/// A [`PageOutbox`] that records everything the page posts.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutbox {
    sent: Arc<Mutex<Vec<PageToBridge>>>,
    fail: bool,
}

impl RecordingOutbox {
    /// Create an outbox that accepts every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an outbox whose every post fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Messages posted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<PageToBridge> {
        self.sent.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl PageOutbox for RecordingOutbox {
    fn post(&self, message: PageToBridge) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::Unavailable("outbox closed".to_owned()));
        }
        if let Ok(mut guard) = self.sent.lock() {
            guard.push(message);
        }
        Ok(())
    }
}

/// A [`PagePort`] that records the bridge's answers.
#[derive(Debug, Clone, Default)]
pub struct RecordingPagePort {
    sent: Arc<Mutex<Vec<BridgeToPage>>>,
}

impl RecordingPagePort {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers posted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<BridgeToPage> {
        self.sent.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl PagePort for RecordingPagePort {
    fn post(&self, message: BridgeToPage) -> Result<(), TransportError> {
        if let Ok(mut guard) = self.sent.lock() {
            guard.push(message);
        }
        Ok(())
    }
}

/// A background transport that replies from a script.
///
/// When the script is empty every send fails with
/// [`TransportError::Unavailable`], which models an unreachable background.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<BackgroundReply>>>,
    sent: Arc<Mutex<Vec<BridgeToBackground>>>,
}

impl MockTransport {
    /// Create a transport with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply.
    #[must_use]
    pub fn with_reply(self, reply: BackgroundReply) -> Self {
        if let Ok(mut guard) = self.replies.lock() {
            guard.push_back(reply);
        }
        self
    }

    /// Messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<BridgeToBackground> {
        self.sent.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BackgroundTransport for MockTransport {
    async fn send(&self, message: BridgeToBackground) -> Result<BackgroundReply, TransportError> {
        if let Ok(mut guard) = self.sent.lock() {
            guard.push(message);
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut g| g.pop_front())
            .ok_or_else(|| TransportError::Unavailable("no scripted reply".to_owned()))
    }
}

/// A [`TabNotifier`] that records notifications per tab.
#[derive(Debug, Clone, Default)]
pub struct RecordingTabNotifier {
    sent: Arc<Mutex<Vec<(TabId, BackgroundToBridge)>>>,
}

impl RecordingTabNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<(TabId, BackgroundToBridge)> {
        self.sent.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl TabNotifier for RecordingTabNotifier {
    fn notify(&self, tab: TabId, message: BackgroundToBridge) -> Result<(), TransportError> {
        if let Ok(mut guard) = self.sent.lock() {
            guard.push((tab, message));
        }
        Ok(())
    }
}

/// A warning view driven by the test.
///
/// `present` waits until a choice is queued, so a test can inspect the
/// shown warning before answering it. Confirmations are answered from
/// their own queue and default to declining.
pub struct ScriptedPrompt {
    choices: Mutex<VecDeque<PromptChoice>>,
    confirmations: Mutex<VecDeque<ConfirmResponse>>,
    wakeup: Notify,
    shown_tx: mpsc::UnboundedSender<Warning>,
    shown_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Warning>>,
    dismissed: Mutex<Vec<RequestId>>,
}

impl Default for ScriptedPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedPrompt {
    /// Create a prompt with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        let (shown_tx, shown_rx) = mpsc::unbounded_channel();
        Self {
            choices: Mutex::new(VecDeque::new()),
            confirmations: Mutex::new(VecDeque::new()),
            wakeup: Notify::new(),
            shown_tx,
            shown_rx: tokio::sync::Mutex::new(shown_rx),
            dismissed: Mutex::new(Vec::new()),
        }
    }

    /// Answer the next (or current) warning with `choice`.
    pub fn choose(&self, choice: PromptChoice) {
        if let Ok(mut guard) = self.choices.lock() {
            guard.push_back(choice);
        }
        self.wakeup.notify_one();
    }

    /// Queue the answer to the next confirmation.
    pub fn answer_confirmation(&self, response: ConfirmResponse) {
        if let Ok(mut guard) = self.confirmations.lock() {
            guard.push_back(response);
        }
    }

    /// Proceed through the next warning, confirming with `response`.
    pub fn proceed_with(&self, response: ConfirmResponse) {
        self.answer_confirmation(response);
        self.choose(PromptChoice::Proceed);
    }

    /// Wait for the next warning to be shown.
    pub async fn next_shown(&self) -> Option<Warning> {
        self.shown_rx.lock().await.recv().await
    }

    /// Ids whose warning has been closed.
    #[must_use]
    pub fn dismissed(&self) -> Vec<RequestId> {
        self.dismissed.lock().map(|g| g.clone()).unwrap_or_default()
    }

    fn pop_choice(&self) -> Option<PromptChoice> {
        self.choices.lock().ok().and_then(|mut g| g.pop_front())
    }
}

#[async_trait]
impl DecisionPrompt for ScriptedPrompt {
    async fn present(&self, warning: &Warning) -> PromptChoice {
        let _ = self.shown_tx.send(warning.clone());
        loop {
            if let Some(choice) = self.pop_choice() {
                return choice;
            }
            self.wakeup.notified().await;
        }
    }

    async fn confirm(&self, _confirmation: &Confirmation) -> ConfirmResponse {
        self.confirmations
            .lock()
            .ok()
            .and_then(|mut g| g.pop_front())
            .unwrap_or(ConfirmResponse::Declined)
    }

    fn dismiss(&self, tx_id: &RequestId) {
        if let Ok(mut guard) = self.dismissed.lock() {
            guard.push(tx_id.clone());
        }
    }
}

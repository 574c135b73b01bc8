//! In-process wiring of page, bridge and background.
//!
//! [`GuardHarness`] connects the three contexts directly: page posts are
//! handed to the bridge on a fresh task, bridge answers go straight into the
//! page gate, and background notifications reach the bridge of the single
//! simulated tab. The wallet behind the guard is a [`MockProvider`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use async_trait::async_trait;
use tokio::task::JoinHandle;

use allowguard_bridge::{
    BackgroundTransport, BridgeOptions, DecisionBridge, DecisionPrompt, PagePort,
    spawn_event_forwarder,
};
use allowguard_classifier::PayloadClassifier;
use allowguard_core::message::{
    BackgroundReply, BackgroundToBridge, BridgeToBackground, BridgeToPage, PageToBridge,
};
use allowguard_core::{TabId, TransportError};
use allowguard_events::EventBus;
use allowguard_interceptor::{
    DecisionGate, InterceptorOptions, PageDecisionGate, PageOutbox, Provider, ProviderInterceptor,
    ProviderSlot,
};
use allowguard_ledger::{BackgroundService, LedgerOptions, PendingLedger, TabNotifier};

use crate::fixtures::test_classifier;
use crate::mocks::{MockProvider, ScriptedPrompt};

/// The tab every harness runs in.
pub const HARNESS_TAB: TabId = TabId(1);

/// Late-bound reference that breaks the page/bridge/background cycle.
struct Link<T>(OnceLock<Weak<T>>);

impl<T> Link<T> {
    fn new() -> Self {
        Self(OnceLock::new())
    }

    fn bind(&self, target: &Arc<T>) {
        let _ = self.0.set(Arc::downgrade(target));
    }

    fn get(&self) -> Result<Arc<T>, TransportError> {
        self.0
            .get()
            .and_then(Weak::upgrade)
            .ok_or(TransportError::Disconnected)
    }
}

struct BridgeOutbox {
    bridge: Link<DecisionBridge>,
}

impl PageOutbox for BridgeOutbox {
    fn post(&self, message: PageToBridge) -> Result<(), TransportError> {
        let bridge = self.bridge.get()?;
        drop(bridge.spawn_page_message(message));
        Ok(())
    }
}

struct GatePort {
    gate: Link<PageDecisionGate>,
}

impl PagePort for GatePort {
    fn post(&self, message: BridgeToPage) -> Result<(), TransportError> {
        self.gate.get()?.handle_message(message);
        Ok(())
    }
}

struct BridgeNotifier {
    bridge: Link<DecisionBridge>,
}

impl TabNotifier for BridgeNotifier {
    fn notify(&self, tab: TabId, message: BackgroundToBridge) -> Result<(), TransportError> {
        if tab != HARNESS_TAB {
            return Err(TransportError::Unavailable(format!("no tab {tab}")));
        }
        self.bridge.get()?.handle_background_message(message);
        Ok(())
    }
}

/// Bridge-to-background channel that can be cut to simulate an unreachable
/// background.
pub struct InProcessTransport {
    service: Arc<BackgroundService>,
    reachable: AtomicBool,
}

impl InProcessTransport {
    /// Make the background reachable or not.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl BackgroundTransport for InProcessTransport {
    async fn send(&self, message: BridgeToBackground) -> Result<BackgroundReply, TransportError> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable(
                "Extension context invalidated.".to_owned(),
            ));
        }
        Ok(self.service.handle(message, Some(HARNESS_TAB)))
    }
}

/// Options for building a [`GuardHarness`].
#[derive(Debug, Clone, Default)]
pub struct HarnessOptions {
    /// Page-side wait policy.
    pub interceptor: InterceptorOptions,
    /// Bridge limits.
    pub bridge: BridgeOptions,
    /// Ledger expiry.
    pub ledger: LedgerOptions,
    /// Classifier for both page and background; the sample lists if `None`.
    pub classifier: Option<PayloadClassifier>,
}

/// A fully wired guard for one tab.
pub struct GuardHarness {
    wallet: MockProvider,
    provider: Arc<dyn Provider>,
    slot: ProviderSlot,
    gate: Arc<PageDecisionGate>,
    bridge: Arc<DecisionBridge>,
    service: Arc<BackgroundService>,
    transport: Arc<InProcessTransport>,
    prompt: Arc<ScriptedPrompt>,
}

impl GuardHarness {
    /// Wire a harness with default options around `wallet`.
    #[must_use]
    pub fn new(wallet: MockProvider) -> Self {
        Self::with_options(wallet, HarnessOptions::default())
    }

    /// Wire a harness around `wallet`.
    #[must_use]
    pub fn with_options(wallet: MockProvider, options: HarnessOptions) -> Self {
        let classifier = options.classifier.unwrap_or_else(test_classifier);

        let notifier = Arc::new(BridgeNotifier {
            bridge: Link::new(),
        });
        let ledger = Arc::new(PendingLedger::with_options(
            Arc::clone(&notifier) as Arc<dyn TabNotifier>,
            &options.ledger,
        ));
        let service = Arc::new(BackgroundService::new(
            ledger,
            classifier.clone(),
            EventBus::new(),
        ));
        let transport = Arc::new(InProcessTransport {
            service: Arc::clone(&service),
            reachable: AtomicBool::new(true),
        });

        let page_port = Arc::new(GatePort { gate: Link::new() });
        let prompt = Arc::new(ScriptedPrompt::new());
        let bridge = Arc::new(DecisionBridge::new(
            Arc::clone(&transport) as Arc<dyn BackgroundTransport>,
            Arc::clone(&page_port) as Arc<dyn PagePort>,
            Arc::clone(&prompt) as Arc<dyn DecisionPrompt>,
            EventBus::new(),
            options.bridge,
        ));
        notifier.bridge.bind(&bridge);

        let outbox = Arc::new(BridgeOutbox {
            bridge: Link::new(),
        });
        outbox.bridge.bind(&bridge);
        let gate = Arc::new(PageDecisionGate::from_options(
            outbox,
            &options.interceptor,
        ));
        page_port.gate.bind(&gate);

        let interceptor = Arc::new(ProviderInterceptor::new(
            classifier,
            Arc::clone(&gate) as Arc<dyn DecisionGate>,
        ));
        let raw: Arc<dyn Provider> = Arc::new(wallet.clone());
        let provider = interceptor.wrap(Arc::clone(&raw));
        let slot = ProviderSlot::new(interceptor);
        slot.set(raw);
        slot.install();

        Self {
            wallet,
            provider,
            slot,
            gate,
            bridge,
            service,
            transport,
            prompt,
        }
    }

    /// The guarded provider a dapp would call.
    #[must_use]
    pub fn provider(&self) -> Arc<dyn Provider> {
        Arc::clone(&self.provider)
    }

    /// The wallet behind the guard.
    #[must_use]
    pub fn wallet(&self) -> &MockProvider {
        &self.wallet
    }

    /// The page's provider slot.
    #[must_use]
    pub fn slot(&self) -> &ProviderSlot {
        &self.slot
    }

    /// The page-side decision gate.
    #[must_use]
    pub fn gate(&self) -> &Arc<PageDecisionGate> {
        &self.gate
    }

    /// The bridge.
    #[must_use]
    pub fn bridge(&self) -> &Arc<DecisionBridge> {
        &self.bridge
    }

    /// The background service.
    #[must_use]
    pub fn service(&self) -> &Arc<BackgroundService> {
        &self.service
    }

    /// The warning view.
    #[must_use]
    pub fn prompt(&self) -> &Arc<ScriptedPrompt> {
        &self.prompt
    }

    /// Cut or restore the bridge's link to the background.
    pub fn set_background_reachable(&self, reachable: bool) {
        self.transport.set_reachable(reachable);
    }

    /// Relay bridge events to the background's bus.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn forward_events(&self) -> JoinHandle<()> {
        spawn_event_forwarder(
            self.bridge.events(),
            Arc::clone(&self.transport) as Arc<dyn BackgroundTransport>,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{SAFE_CONTRACT, send_transaction_args, unlimited_approve_tx};
    use allowguard_bridge::PromptChoice;

    #[tokio::test]
    async fn test_harness_routes_a_block_back_to_the_page() {
        let harness = GuardHarness::new(MockProvider::new());
        let provider = harness.provider();
        let call = tokio::spawn(async move {
            provider
                .request(send_transaction_args(&unlimited_approve_tx(SAFE_CONTRACT)))
                .await
        });

        let warning = harness.prompt().next_shown().await.unwrap();
        assert!(warning.analysis.is_unlimited_amount);
        harness.prompt().choose(PromptChoice::Block);

        assert!(call.await.unwrap().is_err());
        assert_eq!(harness.wallet().call_count(), 0);
        assert!(harness.service().ledger().is_empty());
        assert_eq!(harness.gate().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_installed_slot_serves_the_same_adapter() {
        let harness = GuardHarness::new(MockProvider::new());
        let installed = harness.slot().get().unwrap();
        assert_eq!(
            Arc::as_ptr(&installed).cast::<()>(),
            Arc::as_ptr(&harness.provider()).cast::<()>()
        );
    }
}

//! Background message handling.

use std::sync::Arc;

use tracing::{debug, info};

use allowguard_classifier::PayloadClassifier;
use allowguard_core::message::{AckReply, AnalysisReply, BackgroundReply, BridgeToBackground};
use allowguard_core::{Decision, RawCallPayload, RiskVerdict, TabId};
use allowguard_events::{EventBus, GuardEvent};

use crate::ledger::PendingLedger;

const SOURCE: &str = "background";

/// The background context's message handler.
///
/// Classification here is authoritative: the background re-classifies every
/// payload with its own blacklist instead of trusting the page's verdict.
pub struct BackgroundService {
    ledger: Arc<PendingLedger>,
    classifier: PayloadClassifier,
    events: EventBus,
}

impl BackgroundService {
    /// Create a service over `ledger`.
    #[must_use]
    pub fn new(ledger: Arc<PendingLedger>, classifier: PayloadClassifier, events: EventBus) -> Self {
        Self {
            ledger,
            classifier,
            events,
        }
    }

    /// The ledger this service registers requests in.
    #[must_use]
    pub fn ledger(&self) -> &Arc<PendingLedger> {
        &self.ledger
    }

    /// Bus on which `LOG_EVENT`s are republished.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Handle one message from a bridge running in `sender_tab`.
    pub fn handle(&self, message: BridgeToBackground, sender_tab: Option<TabId>) -> BackgroundReply {
        let swept = self.ledger.sweep_expired();
        if swept > 0 {
            debug!(swept, "expired pending requests dropped");
        }

        match message {
            BridgeToBackground::AnalyzeTransaction { data } => {
                let verdict = self.classifier.classify_transaction(&data);
                self.analyze(RawCallPayload::Transaction(data), verdict, sender_tab)
            },
            BridgeToBackground::AnalyzeSignature { data } => {
                let verdict = self.classifier.classify_signature(data.method, &data.params);
                let payload = RawCallPayload::Signature {
                    method: data.method,
                    params: data.params,
                };
                self.analyze(payload, verdict, sender_tab)
            },
            BridgeToBackground::UserDecision { tx_id, allow } => {
                let success = self.ledger.resolve(&tx_id, Decision::from(allow)).is_ok();
                BackgroundReply::Ack(AckReply { success })
            },
            BridgeToBackground::GetPendingTx { tx_id } => {
                BackgroundReply::Pending(self.ledger.get(&tx_id))
            },
            BridgeToBackground::LogEvent {
                event_type,
                details,
            } => {
                self.events
                    .publish(GuardEvent::new(SOURCE, event_type, details));
                BackgroundReply::Ack(AckReply { success: true })
            },
            BridgeToBackground::Ping => BackgroundReply::Ack(AckReply { success: true }),
        }
    }

    fn analyze(
        &self,
        payload: RawCallPayload,
        verdict: RiskVerdict,
        sender_tab: Option<TabId>,
    ) -> BackgroundReply {
        if !verdict.is_risky {
            debug!(method = payload.method(), "request not risky");
            return BackgroundReply::Analysis(AnalysisReply::allow());
        }
        let tx_id = self.ledger.register(payload, verdict.clone(), sender_tab);
        info!(
            %tx_id,
            category = %verdict.category,
            reasons = verdict.risk_reasons.len(),
            "risky request registered"
        );
        BackgroundReply::Analysis(AnalysisReply::show_warning(tx_id, verdict))
    }
}

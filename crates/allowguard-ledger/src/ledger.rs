//! The pending-request ledger.
//!
//! Lives for one background lifetime and starts empty on every cold start.
//! A request in flight across a restart is orphaned: its id is unknown to
//! the new ledger and resolving it is a logged no-op.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use allowguard_core::message::BackgroundToBridge;
use allowguard_core::{
    Decision, GuardError, GuardResult, PendingRequest, RawCallPayload, RequestId,
    RequestIdGenerator, RiskVerdict, TabId, TransportError,
};

/// Prefix of ledger-assigned ids (`tx_<counter>_<millis>`).
pub const LEDGER_ID_PREFIX: &str = "tx";

/// Delivers decisions to the tab that originated a request
/// (`chrome.tabs.sendMessage`).
pub trait TabNotifier: Send + Sync {
    /// Send `message` to `tab`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the tab is gone.
    fn notify(&self, tab: TabId, message: BackgroundToBridge) -> Result<(), TransportError>;
}

/// Ledger tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerOptions {
    /// Age after which [`PendingLedger::sweep_expired`] drops an entry.
    pub ttl: Option<Duration>,
}

#[cfg(feature = "config")]
impl From<&allowguard_config::LedgerSection> for LedgerOptions {
    fn from(section: &allowguard_config::LedgerSection) -> Self {
        Self { ttl: section.ttl() }
    }
}

/// Registry of requests awaiting a human decision.
///
/// `register`, `resolve` and `sweep_expired` are the only mutators; the map
/// itself is never exposed.
pub struct PendingLedger {
    entries: Mutex<HashMap<RequestId, PendingRequest>>,
    ids: RequestIdGenerator,
    notifier: Arc<dyn TabNotifier>,
    ttl: Option<Duration>,
}

impl PendingLedger {
    /// Create an empty ledger without expiry.
    #[must_use]
    pub fn new(notifier: Arc<dyn TabNotifier>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ids: RequestIdGenerator::new(),
            notifier,
            ttl: None,
        }
    }

    /// Create an empty ledger with `options`.
    #[must_use]
    pub fn with_options(notifier: Arc<dyn TabNotifier>, options: &LedgerOptions) -> Self {
        let mut ledger = Self::new(notifier);
        ledger.ttl = options.ttl;
        ledger
    }

    /// Store a new pending request and return its fresh id.
    pub fn register(
        &self,
        payload: RawCallPayload,
        verdict: RiskVerdict,
        origin_tab: Option<TabId>,
    ) -> RequestId {
        let request_id = self.ids.next_with_prefix(LEDGER_ID_PREFIX);
        let method = payload.method();
        let record = PendingRequest::new(request_id.clone(), origin_tab, payload, verdict);
        let outstanding = {
            let mut entries = self.lock_entries();
            entries.insert(request_id.clone(), record);
            entries.len()
        };
        debug!(%request_id, method, outstanding, "registered pending request");
        request_id
    }

    /// Remove `request_id` and tell its origin tab about `decision`.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::UnknownRequest`] for ids the ledger does not
    /// hold, such as a duplicate resolution or an id from before a restart.
    /// Nothing is changed in that case.
    pub fn resolve(&self, request_id: &RequestId, decision: Decision) -> GuardResult<()> {
        let Some(record) = self.lock_entries().remove(request_id) else {
            warn!(%request_id, "resolution for unknown request id ignored");
            return Err(GuardError::UnknownRequest {
                request_id: request_id.to_string(),
            });
        };
        info!(%request_id, %decision, "pending request resolved");
        self.notify(&record, decision);
        Ok(())
    }

    /// Look up a pending request.
    #[must_use]
    pub fn get(&self, request_id: &RequestId) -> Option<PendingRequest> {
        self.lock_entries().get(request_id).cloned()
    }

    /// Number of outstanding requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// Whether nothing is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    /// Drop entries older than the configured TTL, telling each origin tab
    /// to block.
    ///
    /// Returns the number of entries dropped. Without a TTL this does
    /// nothing.
    pub fn sweep_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let Some(cutoff) = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return 0;
        };

        let expired: Vec<PendingRequest> = {
            let mut entries = self.lock_entries();
            let ids: Vec<RequestId> = entries
                .values()
                .filter(|r| r.is_older_than(cutoff))
                .map(|r| r.request_id.clone())
                .collect();
            ids.iter().filter_map(|id| entries.remove(id)).collect()
        };

        for record in &expired {
            info!(request_id = %record.request_id, "pending request expired");
            self.notify(record, Decision::Block);
        }
        expired.len()
    }

    fn notify(&self, record: &PendingRequest, decision: Decision) {
        let Some(tab) = record.origin_tab_id else {
            debug!(request_id = %record.request_id, "no origin tab to notify");
            return;
        };
        let message = BackgroundToBridge::TransactionDecision {
            tx_id: record.request_id.clone(),
            allow: decision.is_allowed(),
        };
        if let Err(e) = self.notifier.notify(tab, message) {
            warn!(request_id = %record.request_id, %tab, error = %e, "failed to notify tab");
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<RequestId, PendingRequest>> {
        self.entries.lock().unwrap_or_else(|e| {
            warn!("ledger lock poisoned, recovering");
            e.into_inner()
        })
    }
}

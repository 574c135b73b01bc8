//! Configuration struct definitions.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The complete guard configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Known-malicious addresses.
    pub blacklist: BlacklistSection,
    /// Verifying contracts that always need a decision.
    pub contracts: ContractsSection,
    /// Page-side interception.
    pub interceptor: InterceptorSection,
    /// Content bridge.
    pub bridge: BridgeSection,
    /// Background ledger.
    pub ledger: LedgerSection,
    /// Logging and tracing.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// BlacklistSection
// ---------------------------------------------------------------------------

/// Known-malicious addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlacklistSection {
    /// Hex addresses, any casing.
    pub addresses: Vec<String>,
}

impl Default for BlacklistSection {
    fn default() -> Self {
        Self {
            addresses: vec![
                "0x0000000000000000000000000000000000000001".to_owned(),
                "0xdead000000000000000000000000000000000000".to_owned(),
                "0xbad0000000000000000000000000000000000000".to_owned(),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// ContractsSection
// ---------------------------------------------------------------------------

/// Verifying contracts recognised in typed-data domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractsSection {
    /// Marketplace (Seaport) contracts.
    pub marketplaces: Vec<String>,
    /// Universal permit (Permit2) contracts.
    pub permits: Vec<String>,
}

impl Default for ContractsSection {
    fn default() -> Self {
        Self {
            marketplaces: vec![
                "0x00000000000000adc04c56bf30ac9d3c0aaf14dc".to_owned(),
                "0x00000000000001ad428e4906ae43d8f9852d0dd6".to_owned(),
                "0x0000000000000068f116a894984e2db1123eb395".to_owned(),
            ],
            permits: vec!["0x000000000022d473030f116ddee9f6b43ac78ba3".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// InterceptorSection
// ---------------------------------------------------------------------------

/// What a suspended call does when its decision times out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutFallback {
    /// Forward the call, as on a transport failure.
    #[default]
    Allow,
    /// Reject the call.
    Block,
}

impl TimeoutFallback {
    /// Whether the fallback lets the call through.
    #[must_use]
    pub fn allows(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Page-side interception settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptorSection {
    /// Delays between installation attempts, in milliseconds.
    pub retry_delays_ms: Vec<u64>,
    /// How long a suspended call waits for a decision. Unset waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_timeout_ms: Option<u64>,
    /// Outcome applied when the decision times out.
    pub timeout_fallback: TimeoutFallback,
}

impl Default for InterceptorSection {
    fn default() -> Self {
        Self {
            retry_delays_ms: vec![0, 100, 500, 1000, 2000],
            decision_timeout_ms: None,
            timeout_fallback: TimeoutFallback::Allow,
        }
    }
}

impl InterceptorSection {
    /// Retry schedule as durations.
    #[must_use]
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.retry_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }

    /// Decision timeout as a duration.
    #[must_use]
    pub fn decision_timeout(&self) -> Option<Duration> {
        self.decision_timeout_ms.map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// BridgeSection
// ---------------------------------------------------------------------------

/// Content bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    /// Capacity of the correlation map.
    pub max_pending: usize,
    /// Phrase the user must type to proceed with a risky signature.
    pub confirmation_phrase: String,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            max_pending: 256,
            confirmation_phrase: "I UNDERSTAND THE RISK".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// LedgerSection
// ---------------------------------------------------------------------------

/// Background ledger settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    /// Expiry for pending entries, in seconds. Unset never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

impl LedgerSection {
    /// Expiry as a duration.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["allowguard_bridge=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

//! Bridge tuning.

/// Default capacity of the correlation map.
pub const DEFAULT_MAX_PENDING: usize = 256;

/// Default phrase a user must type to proceed with a risky signature.
pub const DEFAULT_CONFIRMATION_PHRASE: &str = "I UNDERSTAND THE RISK";

/// Options for a [`DecisionBridge`](crate::DecisionBridge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Maximum number of requests awaiting a decision.
    pub max_pending: usize,
    /// Phrase required to proceed with a risky signature.
    pub confirmation_phrase: String,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            max_pending: DEFAULT_MAX_PENDING,
            confirmation_phrase: DEFAULT_CONFIRMATION_PHRASE.to_owned(),
        }
    }
}

impl BridgeOptions {
    /// Set the correlation map capacity.
    #[must_use]
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }
}

#[cfg(feature = "config")]
impl From<&allowguard_config::BridgeSection> for BridgeOptions {
    fn from(section: &allowguard_config::BridgeSection) -> Self {
        Self {
            max_pending: section.max_pending,
            confirmation_phrase: section.confirmation_phrase.clone(),
        }
    }
}

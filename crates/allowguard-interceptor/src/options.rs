//! Interceptor tuning.

use std::time::Duration;

use allowguard_core::Decision;

/// Installation schedule and decision-wait policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorOptions {
    /// Delay before each installation attempt.
    pub retry_delays: Vec<Duration>,
    /// Maximum wait for a decision. `None` waits indefinitely.
    pub decision_timeout: Option<Duration>,
    /// Decision applied when `decision_timeout` elapses.
    pub timeout_fallback: Decision,
}

impl Default for InterceptorOptions {
    fn default() -> Self {
        Self {
            retry_delays: [0, 100, 500, 1000, 2000]
                .into_iter()
                .map(Duration::from_millis)
                .collect(),
            decision_timeout: None,
            timeout_fallback: Decision::Allow,
        }
    }
}

#[cfg(feature = "config")]
impl From<&allowguard_config::InterceptorSection> for InterceptorOptions {
    fn from(section: &allowguard_config::InterceptorSection) -> Self {
        Self {
            retry_delays: section.retry_delays(),
            decision_timeout: section.decision_timeout(),
            timeout_fallback: Decision::from(section.timeout_fallback.allows()),
        }
    }
}

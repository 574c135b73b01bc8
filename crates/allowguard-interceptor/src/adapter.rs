//! Adapter cache: one [`GuardedProvider`] per wrapped provider.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{debug, warn};

use allowguard_classifier::PayloadClassifier;

use crate::gate::DecisionGate;
use crate::guarded::GuardedProvider;
use crate::provider::Provider;

struct AdapterEntry {
    target: Weak<dyn Provider>,
    adapter: Weak<GuardedProvider>,
}

/// Produces guarded adapters, at most one live adapter per provider.
///
/// Wrapping is idempotent: wrapping a provider that already has a live
/// adapter returns that adapter, and wrapping an adapter returns it as is.
/// The wrapped provider itself is never modified.
pub struct ProviderInterceptor {
    classifier: PayloadClassifier,
    gate: Arc<dyn DecisionGate>,
    adapters: Mutex<Vec<AdapterEntry>>,
}

impl ProviderInterceptor {
    /// Create an interceptor that screens with `classifier` and suspends
    /// risky calls on `gate`.
    #[must_use]
    pub fn new(classifier: PayloadClassifier, gate: Arc<dyn DecisionGate>) -> Self {
        Self {
            classifier,
            gate,
            adapters: Mutex::new(Vec::new()),
        }
    }

    /// Wrap `target`, or return its existing adapter.
    pub fn wrap(&self, target: Arc<dyn Provider>) -> Arc<dyn Provider> {
        let mut adapters = self.lock_adapters();
        adapters.retain(|e| e.target.strong_count() > 0 && e.adapter.strong_count() > 0);

        let target_ptr = thin(Arc::as_ptr(&target));
        if adapters
            .iter()
            .any(|e| thin(Weak::as_ptr(&e.adapter)) == target_ptr)
        {
            debug!("provider is already a guarded adapter");
            return target;
        }

        let existing = adapters
            .iter()
            .find(|e| thin(Weak::as_ptr(&e.target)) == target_ptr)
            .and_then(|e| e.adapter.upgrade());
        if let Some(adapter) = existing {
            debug!("reusing existing adapter");
            return adapter;
        }

        let adapter = Arc::new(GuardedProvider::new(
            Arc::clone(&target),
            self.classifier.clone(),
            Arc::clone(&self.gate),
        ));
        adapters.push(AdapterEntry {
            target: Arc::downgrade(&target),
            adapter: Arc::downgrade(&adapter),
        });
        debug!(live_adapters = adapters.len(), "wrapped provider");
        adapter
    }

    /// Whether `provider` is an adapter produced by this interceptor.
    #[must_use]
    pub fn is_adapter(&self, provider: &Arc<dyn Provider>) -> bool {
        let ptr = thin(Arc::as_ptr(provider));
        self.lock_adapters()
            .iter()
            .any(|e| e.adapter.strong_count() > 0 && thin(Weak::as_ptr(&e.adapter)) == ptr)
    }

    /// Number of live adapters.
    #[must_use]
    pub fn adapter_count(&self) -> usize {
        self.lock_adapters()
            .iter()
            .filter(|e| e.adapter.strong_count() > 0)
            .count()
    }

    fn lock_adapters(&self) -> MutexGuard<'_, Vec<AdapterEntry>> {
        self.adapters.lock().unwrap_or_else(|e| {
            warn!("adapter cache lock poisoned, recovering");
            e.into_inner()
        })
    }
}

fn thin<T: ?Sized>(ptr: *const T) -> *const () {
    ptr.cast::<()>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateRequest;
    use allowguard_core::{Decision, ProviderError, RequestArguments};
    use async_trait::async_trait;
    use serde_json::Value;

    struct NullProvider;

    #[async_trait]
    impl Provider for NullProvider {
        async fn request(&self, _args: RequestArguments) -> Result<Value, ProviderError> {
            Ok(Value::Null)
        }
    }

    struct AllowGate;

    #[async_trait]
    impl DecisionGate for AllowGate {
        async fn decide(&self, _request: GateRequest) -> Decision {
            Decision::Allow
        }
    }

    fn interceptor() -> ProviderInterceptor {
        ProviderInterceptor::new(PayloadClassifier::default(), Arc::new(AllowGate))
    }

    #[test]
    fn test_wrap_twice_returns_same_adapter() {
        let interceptor = interceptor();
        let target: Arc<dyn Provider> = Arc::new(NullProvider);
        let first = interceptor.wrap(Arc::clone(&target));
        let second = interceptor.wrap(Arc::clone(&target));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(interceptor.adapter_count(), 1);
    }

    #[test]
    fn test_wrapping_an_adapter_is_a_no_op() {
        let interceptor = interceptor();
        let adapter = interceptor.wrap(Arc::new(NullProvider));
        let again = interceptor.wrap(Arc::clone(&adapter));
        assert!(Arc::ptr_eq(&adapter, &again));
        assert!(interceptor.is_adapter(&adapter));
        assert_eq!(interceptor.adapter_count(), 1);
    }

    #[test]
    fn test_distinct_providers_get_distinct_adapters() {
        let interceptor = interceptor();
        let a = interceptor.wrap(Arc::new(NullProvider));
        let b = interceptor.wrap(Arc::new(NullProvider));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(interceptor.adapter_count(), 2);
    }

    #[test]
    fn test_dropped_adapters_are_pruned() {
        let interceptor = interceptor();
        let target: Arc<dyn Provider> = Arc::new(NullProvider);
        drop(interceptor.wrap(Arc::clone(&target)));
        assert_eq!(interceptor.adapter_count(), 0);

        let rewrapped = interceptor.wrap(target);
        assert!(interceptor.is_adapter(&rewrapped));
    }
}

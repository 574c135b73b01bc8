//! The guarding decorator.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use allowguard_classifier::PayloadClassifier;
use allowguard_core::{ProviderError, RequestArguments, RequestKind, SignatureRequest};

use crate::gate::{DecisionGate, GateRequest};
use crate::provider::{Provider, ResponseCallback};

/// A [`Provider`] that screens every call before forwarding it.
///
/// - `eth_sendTransaction` and the guarded signing methods are classified.
///   A risky call is suspended on the [`DecisionGate`]; blocked calls fail
///   with [`ProviderError::blocked`] and never reach the inner provider.
/// - Everything else is forwarded unchanged.
pub struct GuardedProvider {
    inner: Arc<dyn Provider>,
    classifier: PayloadClassifier,
    gate: Arc<dyn DecisionGate>,
}

impl GuardedProvider {
    /// Wrap `inner`.
    ///
    /// Prefer [`ProviderInterceptor::wrap`](crate::ProviderInterceptor::wrap),
    /// which never wraps the same provider twice.
    #[must_use]
    pub fn new(
        inner: Arc<dyn Provider>,
        classifier: PayloadClassifier,
        gate: Arc<dyn DecisionGate>,
    ) -> Self {
        Self {
            inner,
            classifier,
            gate,
        }
    }

    /// The wrapped provider.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn Provider> {
        &self.inner
    }

    /// Decide whether `args` may reach the inner provider.
    ///
    /// # Errors
    ///
    /// Returns the block error when the request is risky and was blocked.
    pub async fn screen(&self, args: &RequestArguments) -> Result<(), ProviderError> {
        let Some(request) = self.risky_request(args) else {
            return Ok(());
        };
        let kind = request.kind();
        debug!(method = %args.method, "risky request, waiting for decision");

        let decision = self.gate.decide(request).await;
        if decision.is_allowed() {
            debug!(method = %args.method, "risky request allowed");
            Ok(())
        } else {
            info!(method = %args.method, "request blocked");
            Err(ProviderError::blocked(kind))
        }
    }

    fn risky_request(&self, args: &RequestArguments) -> Option<GateRequest> {
        if let Some(transaction) = args.transaction() {
            let verdict = self.classifier.classify_transaction(&transaction);
            return verdict
                .is_risky
                .then_some(GateRequest::Transaction {
                    transaction,
                    verdict,
                });
        }

        let method = args.sign_method()?;
        let params = args.params.clone().unwrap_or(Value::Null);
        let verdict = self.classifier.classify_signature(method, &params);
        verdict.is_risky.then(|| {
            GateRequest::Signature(SignatureRequest {
                method,
                params,
                verdict,
            })
        })
    }
}

#[async_trait]
impl Provider for GuardedProvider {
    async fn request(&self, args: RequestArguments) -> Result<Value, ProviderError> {
        self.screen(&args).await?;
        self.inner.request(args).await
    }

    async fn send_async(&self, payload: RequestArguments, callback: ResponseCallback) {
        match self.screen(&payload).await {
            Ok(()) => self.inner.send_async(payload, callback).await,
            Err(blocked) => callback(Err(blocked)),
        }
    }
}

impl std::fmt::Debug for GuardedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedProvider").finish_non_exhaustive()
    }
}

/// Kind of request a method name would be screened as, if any.
#[must_use]
pub fn screened_kind(method: &str) -> Option<RequestKind> {
    if method == allowguard_core::payload::SEND_TRANSACTION {
        Some(RequestKind::Transaction)
    } else {
        allowguard_core::SignMethod::from_method(method).map(|_| RequestKind::Signature)
    }
}

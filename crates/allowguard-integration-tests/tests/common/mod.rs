//! Helpers shared by the end-to-end tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;

use allowguard_core::{ProviderError, RequestArguments};
use allowguard_interceptor::Provider;

/// Upper bound on any single wait in these tests.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Await `fut`, failing the test if it takes longer than [`STEP_TIMEOUT`].
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(STEP_TIMEOUT, fut)
        .await
        .expect("step timed out")
}

/// Issue `args` through `provider` on its own task, as a dapp would.
pub fn spawn_request(
    provider: &Arc<dyn Provider>,
    args: RequestArguments,
) -> JoinHandle<Result<Value, ProviderError>> {
    let provider = Arc::clone(provider);
    tokio::spawn(async move { provider.request(args).await })
}

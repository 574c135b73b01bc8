//! The wallet provider capability.

use async_trait::async_trait;
use serde_json::Value;

use allowguard_core::{ProviderError, RequestArguments};

/// Completion callback of the legacy `sendAsync` dispatch.
pub type ResponseCallback = Box<dyn FnOnce(Result<Value, ProviderError>) + Send>;

/// An EIP-1193 wallet provider, reduced to its dispatch methods.
///
/// [`GuardedProvider`](crate::GuardedProvider) implements this trait as well,
/// so a guarded provider can stand in anywhere the real one was used.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Dispatch a JSON-RPC request.
    async fn request(&self, args: RequestArguments) -> Result<Value, ProviderError>;

    /// Legacy callback-style dispatch.
    ///
    /// The default implementation forwards to [`Provider::request`] and
    /// hands the outcome to `callback`.
    async fn send_async(&self, payload: RequestArguments, callback: ResponseCallback) {
        callback(self.request(payload).await);
    }
}

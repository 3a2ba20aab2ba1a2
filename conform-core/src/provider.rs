//! Provider trait: the model backend adapter seam.

use crate::error::BackendError;
use crate::types::*;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Core provider trait for model backends.
///
/// A provider performs exactly one remote call per `chat_completion` and
/// returns the raw text. It never retries: retrying belongs to the runtime's
/// retry controller, which also validates the text.
///
/// Providers are shared by concurrent invocations, so implementations must
/// not keep per-call mutable state.
#[async_trait]
pub trait Provider: Send + Sync + Debug + 'static {
    /// Get provider information
    fn info(&self) -> Arc<ProviderInfo>;

    /// Issue one remote completion.
    ///
    /// Failures are classified as transport, refusal or malformed envelope.
    async fn chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<BackendResponse, BackendError>;
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn info(&self) -> Arc<ProviderInfo> {
        (**self).info()
    }

    async fn chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<BackendResponse, BackendError> {
        (**self).chat_completion(req).await
    }
}

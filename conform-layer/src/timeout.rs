//! Per-call deadline layer.

use async_trait::async_trait;
use conform_core::error::BackendError;
use conform_core::impl_layered_provider;
use conform_core::layer::{Layer, LayeredProvider};
use conform_core::provider::Provider;
use conform_core::types::*;
use std::time::Duration;

/// Bounds each backend call by a deadline.
///
/// A call that overruns is abandoned and reported as
/// [`BackendError::Transport`], so the runtime retries it like any other
/// transport failure.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<P: Provider> Layer<P> for TimeoutLayer {
    type LayeredProvider = TimeoutProvider<P>;

    fn layer(&self, inner: P) -> Self::LayeredProvider {
        TimeoutProvider {
            inner,
            timeout: self.timeout,
        }
    }
}

/// Provider wrapped with a per-call deadline
#[derive(Debug)]
pub struct TimeoutProvider<P> {
    inner: P,
    timeout: Duration,
}

#[async_trait]
impl<P: Provider> LayeredProvider for TimeoutProvider<P> {
    type Inner = P;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<BackendResponse, BackendError> {
        match tokio::time::timeout(self.timeout, self.inner.chat_completion(req)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!("chat_completion exceeded deadline of {:?}", self.timeout);
                Err(BackendError::transport(format!(
                    "backend call timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}

impl_layered_provider!(TimeoutProvider<P>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedProvider;

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest::new("m", vec![Message::user("hi")])
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_becomes_transport_error() {
        let provider = TimeoutLayer::new(Duration::from_secs(5))
            .layer(FixedProvider::ok("{}").with_delay(Duration::from_secs(10)));

        let err = provider.chat_completion(request()).await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)), "{err}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_call_is_untouched() {
        let provider = TimeoutLayer::new(Duration::from_secs(5))
            .layer(FixedProvider::ok("{\"a\":1}").with_delay(Duration::from_secs(1)));

        let response = provider.chat_completion(request()).await.unwrap();
        assert_eq!(response.text, "{\"a\":1}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_inner_errors_keep_their_kind() {
        let provider = TimeoutLayer::new(Duration::from_secs(5))
            .layer(FixedProvider::err(BackendError::malformed_envelope("no choices")));

        let err = provider.chat_completion(request()).await.unwrap_err();
        assert_eq!(err, BackendError::malformed_envelope("no choices"));
    }
}

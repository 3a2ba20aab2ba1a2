//! Logging layer for provider operations.

use async_trait::async_trait;
use conform_core::error::BackendError;
use conform_core::impl_layered_provider;
use conform_core::layer::{Layer, LayeredProvider};
use conform_core::provider::Provider;
use conform_core::types::*;

/// Logging layer that logs every backend call with its timing.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    prefix: String,
}

impl LoggingLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self {
            prefix: "[Conform]".to_string(),
        }
    }

    /// Create a logging layer with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Provider> Layer<P> for LoggingLayer {
    type LayeredProvider = LoggingProvider<P>;

    fn layer(&self, inner: P) -> Self::LayeredProvider {
        LoggingProvider {
            inner,
            prefix: self.prefix.clone(),
        }
    }
}

/// Provider wrapped with logging
#[derive(Debug)]
pub struct LoggingProvider<P> {
    inner: P,
    prefix: String,
}

#[async_trait]
impl<P: Provider> LayeredProvider for LoggingProvider<P> {
    type Inner = P;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<BackendResponse, BackendError> {
        tracing::debug!(
            "{} chat_completion request: model={}, messages={}, max_tokens={}",
            self.prefix,
            req.model,
            req.messages.len(),
            req.max_tokens
        );

        let start = tokio::time::Instant::now();
        let result = self.inner.chat_completion(req).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::debug!(
                    "{} chat_completion success: id={}, tokens={}, chars={}, elapsed={:?}",
                    self.prefix,
                    response.id,
                    response.usage.total_tokens,
                    response.text.len(),
                    elapsed
                );
            }
            Err(e) => {
                tracing::error!(
                    "{} chat_completion error ({}): {}, elapsed={:?}",
                    self.prefix,
                    e.kind(),
                    e,
                    elapsed
                );
            }
        }

        result
    }
}

impl_layered_provider!(LoggingProvider<P>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedProvider;

    #[tokio::test]
    async fn test_logging_passes_results_through() {
        let provider = LoggingLayer::with_prefix("[test]").layer(FixedProvider::ok("{}"));
        let response = provider
            .chat_completion(ChatCompletionRequest::new("m", vec![Message::user("hi")]))
            .await
            .unwrap();
        assert_eq!(response.text, "{}");
        assert_eq!(provider.info().id, "fixed");
    }

    #[tokio::test]
    async fn test_logging_passes_errors_through() {
        let provider = LoggingLayer::new().layer(FixedProvider::err(BackendError::refusal("no")));
        let err = provider
            .chat_completion(ChatCompletionRequest::new("m", vec![Message::user("hi")]))
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::refusal("no"));
    }
}

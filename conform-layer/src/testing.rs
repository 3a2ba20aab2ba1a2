use async_trait::async_trait;
use conform_core::error::BackendError;
use conform_core::provider::Provider;
use conform_core::types::*;
use std::sync::Arc;
use std::time::Duration;

/// Provider that answers every call the same way, optionally after a delay.
#[derive(Debug)]
pub struct FixedProvider {
    result: Result<String, BackendError>,
    delay: Duration,
}

impl FixedProvider {
    pub fn ok(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            delay: Duration::ZERO,
        }
    }

    pub fn err(err: BackendError) -> Self {
        Self {
            result: Err(err),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Provider for FixedProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        Arc::new(ProviderInfo {
            id: "fixed".to_string(),
            name: "Fixed".to_string(),
        })
    }

    async fn chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<BackendResponse, BackendError> {
        tokio::time::sleep(self.delay).await;
        let text = self.result.clone()?;
        Ok(BackendResponse {
            id: "resp-1".to_string(),
            model: req.model,
            text,
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
            latency: self.delay,
        })
    }
}

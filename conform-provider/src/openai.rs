//! OpenAI provider implementation using async-openai crate.
//!
//! The provider issues exactly one HTTP call per `chat_completion`. The
//! client's own rate-limit back-off is switched off so the runtime's retry
//! controller is the only thing that retries.

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    FinishReason as OpenAIFinishReason, ResponseFormat as OpenAIResponseFormat,
    ResponseFormatJsonSchema as OpenAIResponseFormatJsonSchema,
};
use async_openai::Client;
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use conform_core::config::ClientConfig;
use conform_core::error::{BackendError, ConformError};
use conform_core::provider::Provider;
use conform_core::types::*;
use std::sync::Arc;
use std::time::Duration;

/// OpenAI provider using async-openai
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    info: Arc<ProviderInfo>,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("info", &self.info)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with default configuration
    pub fn new(api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);

        Self {
            client: single_shot_client(config),
            info: Arc::new(ProviderInfo {
                id: "openai".to_string(),
                name: "OpenAI".to_string(),
            }),
        }
    }

    /// Create a builder for more configuration options
    pub fn builder() -> OpenAiBuilder {
        OpenAiBuilder::default()
    }

    /// Convert our Message type to OpenAI's ChatCompletionRequestMessage
    fn convert_message(msg: &Message) -> Result<ChatCompletionRequestMessage, BackendError> {
        let content = msg.content.clone();

        match msg.role {
            Role::System => {
                let msg = ChatCompletionRequestSystemMessageArgs::default()
                    .content(content)
                    .build()
                    .map_err(|e| {
                        BackendError::transport(format!("Failed to build system message: {}", e))
                    })?;
                Ok(ChatCompletionRequestMessage::System(msg))
            }
            Role::User => {
                let msg = ChatCompletionRequestUserMessageArgs::default()
                    .content(content)
                    .build()
                    .map_err(|e| {
                        BackendError::transport(format!("Failed to build user message: {}", e))
                    })?;
                Ok(ChatCompletionRequestMessage::User(msg))
            }
            Role::Assistant => {
                let msg = ChatCompletionRequestAssistantMessageArgs::default()
                    .content(content)
                    .build()
                    .map_err(|e| {
                        BackendError::transport(format!(
                            "Failed to build assistant message: {}",
                            e
                        ))
                    })?;
                Ok(ChatCompletionRequestMessage::Assistant(msg))
            }
        }
    }

    /// Convert our ResponseFormat to OpenAI's ResponseFormat
    fn convert_response_format(format: &ResponseFormat) -> OpenAIResponseFormat {
        match format {
            ResponseFormat::Text => OpenAIResponseFormat::Text,
            ResponseFormat::JsonObject => OpenAIResponseFormat::JsonObject,
            ResponseFormat::JsonSchema {
                name,
                schema,
                strict,
            } => OpenAIResponseFormat::JsonSchema {
                json_schema: OpenAIResponseFormatJsonSchema {
                    name: name.clone(),
                    schema: Some(schema.clone()),
                    strict: Some(*strict),
                    description: None,
                },
            },
        }
    }

    /// Build CreateChatCompletionRequest from our ChatCompletionRequest
    #[allow(deprecated)]
    fn build_request(
        &self,
        req: &ChatCompletionRequest,
    ) -> Result<CreateChatCompletionRequest, BackendError> {
        let messages: Result<Vec<_>, _> = req.messages.iter().map(Self::convert_message).collect();

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&req.model)
            .messages(messages?)
            .temperature(req.temperature)
            .max_tokens(req.max_tokens);

        if let Some(response_format) = &req.response_format {
            builder.response_format(Self::convert_response_format(response_format));
        }

        builder
            .build()
            .map_err(|e| BackendError::transport(format!("Failed to build request: {}", e)))
    }

    /// Unwrap the first choice of an OpenAI response into a [`BackendResponse`]
    fn convert_response(
        &self,
        response: async_openai::types::CreateChatCompletionResponse,
        latency: Duration,
    ) -> Result<BackendResponse, BackendError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::malformed_envelope("No choices in response"))?;

        let finish_reason = choice
            .finish_reason
            .map_or(FinishReason::Stop, convert_finish_reason);
        let text = unwrap_content(choice.message.content, choice.message.refusal, &finish_reason)?;

        let usage = response.usage.map_or(Usage::default(), |u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(BackendResponse {
            id: response.id,
            model: response.model,
            text,
            finish_reason,
            usage,
            latency,
        })
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        self.info.clone()
    }

    async fn chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<BackendResponse, BackendError> {
        let openai_req = self.build_request(&req)?;

        let start = tokio::time::Instant::now();
        let response = self
            .client
            .chat()
            .create(openai_req)
            .await
            .map_err(classify_error)?;

        self.convert_response(response, start.elapsed())
    }
}

/// Client whose internal rate-limit retry gives up immediately.
fn single_shot_client(config: OpenAIConfig) -> Client<OpenAIConfig> {
    let backoff = ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..ExponentialBackoff::default()
    };
    Client::with_config(config).with_backoff(backoff)
}

fn convert_finish_reason(reason: OpenAIFinishReason) -> FinishReason {
    match reason {
        OpenAIFinishReason::Stop => FinishReason::Stop,
        OpenAIFinishReason::Length => FinishReason::Length,
        OpenAIFinishReason::ContentFilter => FinishReason::ContentFilter,
        other => FinishReason::Other(format!("{:?}", other).to_lowercase()),
    }
}

/// Extract the text of a choice, classifying refusals and empty messages.
fn unwrap_content(
    content: Option<String>,
    refusal: Option<String>,
    finish_reason: &FinishReason,
) -> Result<String, BackendError> {
    if let Some(refusal) = refusal.filter(|r| !r.is_empty()) {
        return Err(BackendError::refusal(refusal));
    }
    if *finish_reason == FinishReason::ContentFilter {
        return Err(BackendError::refusal("response withheld by content filter"));
    }
    content.ok_or_else(|| BackendError::malformed_envelope("Choice has no message content"))
}

/// Map an async-openai error onto the backend failure kinds.
fn classify_error(err: OpenAIError) -> BackendError {
    match err {
        OpenAIError::Reqwest(e) => BackendError::transport(e.to_string()),
        OpenAIError::ApiError(api) => {
            let message = api.to_string();
            if is_transient_api_error(api.r#type.as_deref(), api.code.as_deref()) {
                BackendError::transport(message)
            } else {
                BackendError::refusal(message)
            }
        }
        e @ OpenAIError::JSONDeserialize(..) => BackendError::malformed_envelope(e.to_string()),
        other => BackendError::malformed_envelope(other.to_string()),
    }
}

/// Throttling, overload and server-side timeouts are transport problems;
/// every other API error is the backend declining the request.
fn is_transient_api_error(error_type: Option<&str>, code: Option<&str>) -> bool {
    const TRANSIENT: [&str; 5] = [
        "rate_limit",
        "server_error",
        "timeout",
        "overloaded",
        "service_unavailable",
    ];
    [error_type, code]
        .into_iter()
        .flatten()
        .any(|s| TRANSIENT.iter().any(|t| s.contains(t)))
}

/// Builder for OpenAI provider with custom configuration
#[derive(Default)]
pub struct OpenAiBuilder {
    api_key: Option<String>,
    api_base: Option<String>,
    org_id: Option<String>,
}

impl OpenAiBuilder {
    /// Start from environment configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_base: config.api_base.clone(),
            org_id: config.organization.clone(),
        }
    }

    /// Set API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set API base URL (for OpenAI-compatible APIs like DeepSeek)
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set organization ID
    pub fn organization(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Build the provider
    pub fn build(self) -> Result<OpenAiProvider, ConformError> {
        self.build_with_id("openai", "OpenAI")
    }

    /// Build a provider with a custom provider ID and name
    ///
    /// This is useful for OpenAI-compatible APIs like DeepSeek that use
    /// the same protocol but different endpoints.
    pub fn build_with_id(
        self,
        provider_id: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Result<OpenAiProvider, ConformError> {
        let api_key = self
            .api_key
            .ok_or_else(|| ConformError::configuration("API key is required"))?;

        let mut config = OpenAIConfig::new().with_api_key(api_key);

        if let Some(api_base) = self.api_base {
            config = config.with_api_base(api_base);
        }

        if let Some(org_id) = self.org_id {
            config = config.with_org_id(org_id);
        }

        Ok(OpenAiProvider {
            client: single_shot_client(config),
            info: Arc::new(ProviderInfo {
                id: provider_id.into(),
                name: provider_name.into(),
            }),
        })
    }
}

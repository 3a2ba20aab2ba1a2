//! Core types for structured completions.

use crate::error::{ConformError, ErrorKind};
use crate::retry::RetryPolicy;
use crate::schema::SchemaDescriptor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Backend used when neither the request nor the executor names one.
pub const DEFAULT_BACKEND_ID: &str = "gpt-4o-mini";

/// Default sampling temperature for structured completions.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Default ceiling on generated output, in tokens.
pub const DEFAULT_MAX_OUTPUT_SIZE: u32 = 4096;

/// Message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Message sent to a backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create a new system message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Token usage reported by the backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Finish reason
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other(String),
}

/// Provider information
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
}

/// Response format for chat completions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text response
    Text,
    /// JSON object response (basic JSON mode, no schema validation)
    JsonObject,
    /// JSON Schema response (with strict schema validation)
    JsonSchema {
        name: String,
        schema: serde_json::Value,
        strict: bool,
    },
}

/// One remote invocation as seen by a backend adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Backend identifier (model id)
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatCompletionRequest {
    /// Create a new chat completion request with default sampling settings
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_OUTPUT_SIZE,
            response_format: None,
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set response format
    pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = Some(response_format);
        self
    }
}

/// Raw text returned by a backend plus the metadata it reported.
///
/// Consumed by the validator right after the call.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub id: String,
    pub model: String,
    pub text: String,
    pub finish_reason: FinishReason,
    pub usage: Usage,
    /// Wall-clock time of the remote call
    pub latency: Duration,
}

/// Everything one `invoke` call needs. Immutable once built.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    task_prompt: String,
    schema: Arc<SchemaDescriptor>,
    backend_id: Option<String>,
    temperature: f32,
    max_output_size: u32,
    retry: RetryPolicy,
}

impl InvocationRequest {
    /// Start building a request for `task_prompt` against `schema`.
    pub fn builder(
        task_prompt: impl Into<String>,
        schema: Arc<SchemaDescriptor>,
    ) -> InvocationRequestBuilder {
        InvocationRequestBuilder {
            task_prompt: task_prompt.into(),
            schema,
            backend_id: None,
            temperature: DEFAULT_TEMPERATURE,
            max_output_size: DEFAULT_MAX_OUTPUT_SIZE,
            max_retries: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            base_delay_seconds: RetryPolicy::DEFAULT_BASE_DELAY.as_secs_f64(),
        }
    }

    pub fn task_prompt(&self) -> &str {
        &self.task_prompt
    }

    pub fn schema(&self) -> &Arc<SchemaDescriptor> {
        &self.schema
    }

    /// Backend named by the request, if any
    pub fn backend_id(&self) -> Option<&str> {
        self.backend_id.as_deref()
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_output_size(&self) -> u32 {
        self.max_output_size
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

/// Builder for [`InvocationRequest`]; `build` checks every parameter.
#[derive(Debug, Clone)]
pub struct InvocationRequestBuilder {
    task_prompt: String,
    schema: Arc<SchemaDescriptor>,
    backend_id: Option<String>,
    temperature: f32,
    max_output_size: u32,
    max_retries: u32,
    base_delay_seconds: f64,
}

impl InvocationRequestBuilder {
    /// Set the backend identifier
    pub fn backend_id(mut self, backend_id: impl Into<String>) -> Self {
        self.backend_id = Some(backend_id.into());
        self
    }

    /// Set the total number of attempts (not retries after the first)
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the second attempt; later delays double
    pub fn base_delay_seconds(mut self, seconds: f64) -> Self {
        self.base_delay_seconds = seconds;
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the output ceiling in tokens
    pub fn max_output_size(mut self, max_output_size: u32) -> Self {
        self.max_output_size = max_output_size;
        self
    }

    pub fn build(self) -> Result<InvocationRequest, ConformError> {
        if self.task_prompt.trim().is_empty() {
            return Err(ConformError::invalid_request("task prompt must not be empty"));
        }
        if matches!(&self.backend_id, Some(id) if id.trim().is_empty()) {
            return Err(ConformError::invalid_request("backend id must not be empty"));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(ConformError::invalid_request(format!(
                "temperature must be a non-negative number, got {}",
                self.temperature
            )));
        }
        if self.max_output_size == 0 {
            return Err(ConformError::invalid_request(
                "max output size must be at least 1",
            ));
        }
        let retry = RetryPolicy::from_seconds(self.max_retries, self.base_delay_seconds)?;

        Ok(InvocationRequest {
            task_prompt: self.task_prompt,
            schema: self.schema,
            backend_id: self.backend_id,
            temperature: self.temperature,
            max_output_size: self.max_output_size,
            retry,
        })
    }
}

/// A value that conforms exactly to the requested schema.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidatedResult {
    pub value: serde_json::Value,
    /// Attempts it took, counting the successful one
    pub attempts: u32,
    pub usage: Usage,
    pub model: String,
}

impl ValidatedResult {
    /// Deserialize the validated value into a concrete type
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.value)
    }

    pub fn into_value(self) -> serde_json::Value {
        self.value
    }
}

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error_kind", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    Failed(ErrorKind),
}

/// Record of one attempt within an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    /// Zero-based attempt index
    pub index: u32,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed: Duration,
    /// Delay scheduled before the next attempt, if one follows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff: Option<Duration>,
}

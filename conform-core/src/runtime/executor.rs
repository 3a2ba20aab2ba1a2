//! RuntimeExecutor implementation.
//!
//! The executor turns an [`InvocationRequest`] into a validated value: it
//! assembles the prompt once, then lets the [`RetryController`] drive
//! `{backend call -> validation}` attempts, reporting each one to the
//! invocation's [`InvocationSpan`].

use crate::error::{AttemptError, TerminalFailure, ValidationError};
use crate::layer::Layer;
use crate::prompt::PromptAssembler;
use crate::provider::Provider;
use crate::retry::RetryController;
use crate::strategy::{detect_json_strategy, JsonOutputStrategy};
use crate::trace::{InvocationSpan, TraceSink, TracingSink};
use crate::types::*;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

/// Type-erased provider that can be shared across threads
type BoxedProvider = Arc<dyn Provider>;

/// Builder for composing a provider with layers, a JSON strategy and a trace sink.
///
/// Layers wrap the provider with static dispatch while building; the result
/// is type-erased once in [`finish`](Self::finish).
///
/// # Example
///
/// ```ignore
/// let executor = RuntimeExecutor::builder(openai_provider)
///     .layer(LoggingLayer::new())
///     .layer(TimeoutLayer::new(Duration::from_secs(30)))
///     .trace_sink(Arc::new(NoopSink))
///     .finish();
/// ```
pub struct RuntimeExecutorBuilder<P> {
    provider: P,
    json_strategy: Option<Box<dyn JsonOutputStrategy>>,
    assembler: PromptAssembler,
    trace_sink: Option<Arc<dyn TraceSink>>,
    default_backend: Option<String>,
}

impl<P: Provider> RuntimeExecutorBuilder<P> {
    /// Create a new builder with a provider
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            json_strategy: None,
            assembler: PromptAssembler::default(),
            trace_sink: None,
            default_backend: None,
        }
    }

    /// Add a layer to wrap the provider
    ///
    /// This uses static dispatch - each call to `layer()` creates a new
    /// concrete type by wrapping the previous provider.
    pub fn layer<L>(self, layer: L) -> RuntimeExecutorBuilder<L::LayeredProvider>
    where
        L: Layer<P>,
    {
        RuntimeExecutorBuilder {
            provider: layer.layer(self.provider),
            json_strategy: self.json_strategy,
            assembler: self.assembler,
            trace_sink: self.trace_sink,
            default_backend: self.default_backend,
        }
    }

    /// Set a custom JSON output strategy
    ///
    /// If not set, the strategy will be auto-detected based on the provider ID.
    pub fn json_strategy(mut self, strategy: Box<dyn JsonOutputStrategy>) -> Self {
        self.json_strategy = Some(strategy);
        self
    }

    pub fn assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Set where invocation traces go. Defaults to [`TracingSink`].
    pub fn trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    /// Backend id used by requests that do not name one
    pub fn default_backend(mut self, backend_id: impl Into<String>) -> Self {
        self.default_backend = Some(backend_id.into());
        self
    }

    /// Finish building and create a RuntimeExecutor
    pub fn finish(self) -> RuntimeExecutor {
        let provider: BoxedProvider = Arc::new(self.provider);
        let provider_id = provider.info().id.clone();

        // Auto-detect strategy if not provided
        let json_strategy = self
            .json_strategy
            .unwrap_or_else(|| detect_json_strategy(&provider_id));

        RuntimeExecutor {
            provider,
            json_strategy,
            assembler: self.assembler,
            trace_sink: self.trace_sink.unwrap_or_else(|| Arc::new(TracingSink)),
            default_backend: self
                .default_backend
                .unwrap_or_else(|| DEFAULT_BACKEND_ID.to_string()),
        }
    }
}

/// Runtime executor for schema-validated completions.
///
/// Holds no per-invocation state, so one executor can be shared behind an
/// `Arc` by any number of concurrent callers.
#[derive(Debug)]
pub struct RuntimeExecutor {
    provider: BoxedProvider,
    json_strategy: Box<dyn JsonOutputStrategy>,
    assembler: PromptAssembler,
    trace_sink: Arc<dyn TraceSink>,
    default_backend: String,
}

/// What the successful attempt produced.
struct Completion<T> {
    value: Value,
    typed: T,
    attempts: u32,
    usage: Usage,
    model: String,
}

impl RuntimeExecutor {
    /// Create a new builder
    pub fn builder<P: Provider>(provider: P) -> RuntimeExecutorBuilder<P> {
        RuntimeExecutorBuilder::new(provider)
    }

    /// Get provider information
    pub fn info(&self) -> Arc<ProviderInfo> {
        self.provider.info()
    }

    pub fn default_backend(&self) -> &str {
        &self.default_backend
    }

    /// Run one invocation to completion.
    ///
    /// Returns the first value that conforms to the request's schema, or a
    /// [`TerminalFailure`] carrying the last error once the attempt ceiling is
    /// reached. Exactly one trace is emitted either way.
    pub async fn invoke(
        &self,
        request: &InvocationRequest,
    ) -> Result<ValidatedResult, TerminalFailure> {
        let done = self.execute(request, |_| Ok(())).await?;
        Ok(ValidatedResult {
            value: done.value,
            attempts: done.attempts,
            usage: done.usage,
            model: done.model,
        })
    }

    /// Like [`invoke`](Self::invoke), deserializing the value into `T`.
    ///
    /// A value that validates but does not deserialize into `T` fails the
    /// attempt with a [`ValidationError`] and is retried.
    pub async fn invoke_as<T: DeserializeOwned>(
        &self,
        request: &InvocationRequest,
    ) -> Result<T, TerminalFailure> {
        let done = self
            .execute(request, |value| {
                T::deserialize(value).map_err(|e| {
                    ValidationError::constraint(
                        "$",
                        format!("does not deserialize into {}: {e}", std::any::type_name::<T>()),
                    )
                })
            })
            .await?;
        Ok(done.typed)
    }

    async fn execute<T, C>(
        &self,
        request: &InvocationRequest,
        convert: C,
    ) -> Result<Completion<T>, TerminalFailure>
    where
        C: Fn(&Value) -> Result<T, ValidationError>,
    {
        let backend_id = request.backend_id().unwrap_or(&self.default_backend);
        let mut span = InvocationSpan::open(self.trace_sink.clone(), backend_id);
        let tracing_span = span.span().clone();

        let schema = request.schema().as_ref();
        let payload = self.assembler.assemble(request.task_prompt(), schema);
        let mut chat_req = ChatCompletionRequest::new(backend_id, payload.messages)
            .with_temperature(request.temperature())
            .with_max_tokens(request.max_output_size());
        self.json_strategy.apply(&mut chat_req, schema);

        tracing::debug!(
            parent: &tracing_span,
            "Invoking {} with strategy {} ({} attempt(s) max)",
            backend_id,
            self.json_strategy.name(),
            request.retry_policy().max_attempts()
        );

        let mut controller = RetryController::new(*request.retry_policy());
        let provider = &self.provider;
        let chat_req = &chat_req;
        let convert = &convert;

        let outcome = controller
            .run(&mut span, |attempt| async move {
                let response = provider.chat_completion(chat_req.clone()).await?;
                let value = schema.validate(&response.text)?;
                let typed = convert(&value)?;
                Ok::<_, AttemptError>(Completion {
                    value,
                    typed,
                    attempts: attempt + 1,
                    usage: response.usage,
                    model: response.model,
                })
            })
            .instrument(tracing_span)
            .await;

        match outcome {
            Ok(done) => {
                span.succeed(&done.value);
                Ok(done)
            }
            Err(failure) => {
                span.fail(&failure);
                Err(failure)
            }
        }
    }
}

//! # Conform Core
//!
//! Core abstractions and runtime for schema-validated LLM completions.
//!
//! An invocation sends a task prompt plus a schema instruction to a model
//! backend, validates the reply against a [`SchemaDescriptor`], and retries
//! with exponential backoff until a conforming value arrives or the attempt
//! ceiling is reached. Every invocation emits exactly one trace.

pub mod config;
pub mod error;
pub mod layer;
pub mod prompt;
pub mod provider;
pub mod retry;
pub mod runtime;
pub mod schema;
pub mod strategy;
pub mod trace;
pub mod types;
pub mod validate;

// Re-exports
pub use config::ClientConfig;
pub use error::{
    AttemptError, BackendError, ConformError, ErrorKind, SchemaError, TerminalFailure,
    ValidationError,
};
pub use layer::{Layer, LayeredProvider};
pub use prompt::{InstructionPayload, PromptAssembler};
pub use provider::Provider;
pub use retry::{AttemptObserver, RetryController, RetryPolicy, RetryState};
pub use runtime::{RuntimeExecutor, RuntimeExecutorBuilder};
pub use schema::{
    AdditionalFields, Constraint, FieldSpec, FieldType, ObjectSpec, SchemaBuilder,
    SchemaDescriptor, ValueSpec,
};
pub use strategy::{
    JsonModeStrategy, JsonOutputStrategy, JsonSchemaStrategy, PromptOnlyStrategy,
};
pub use trace::{
    ChannelSink, InvocationSpan, InvocationTrace, NoopSink, TraceOutcome, TraceSink, TracingSink,
};
pub use types::*;

/// Result type alias for construction-time operations
pub type Result<T> = std::result::Result<T, ConformError>;

//! # Conform
//!
//! Schema-validated LLM completions for Rust.
//!
//! You describe the shape of the answer once as a [`SchemaDescriptor`], then
//! call [`RuntimeExecutor::invoke`]. Conform tells the model about the schema,
//! validates what comes back, and retries with exponential backoff until the
//! reply conforms or the attempt ceiling is reached. The caller either gets a
//! value that matches the schema exactly, or a single [`TerminalFailure`].
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! conform = { version = "0.1", features = ["openai", "layers"] }
//! ```
//!
//! ```ignore
//! use conform::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OpenAiProvider::builder()
//!     .api_key("your-api-key")
//!     .build()?;
//!
//! let executor = RuntimeExecutor::builder(provider)
//!     .layer(LoggingLayer::new())
//!     .finish();
//!
//! let schema = Arc::new(
//!     SchemaDescriptor::builder("review")
//!         .field(FieldSpec::string("sentiment").one_of(["positive", "negative", "neutral"]))
//!         .field(FieldSpec::number("confidence").range(0.0, 1.0))
//!         .build()?,
//! );
//!
//! let request = InvocationRequest::builder("Classify: 'Great value, fast delivery.'", schema)
//!     .max_retries(3)
//!     .build()?;
//!
//! let result = executor.invoke(&request).await?;
//! println!("{} after {} attempt(s)", result.value, result.attempts);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: `openai` and `layers`
//! - `openai`: OpenAI and OpenAI-compatible backends
//! - `layers`: Built-in layers (logging, timeouts)
//! - `schema`: Derive descriptors from types with `schemars`
//! - `full`: All features enabled

// Re-export core types and traits
pub use conform_core::*;

pub mod telemetry;

#[cfg(feature = "schema")]
mod derive;

#[cfg(feature = "schema")]
pub use derive::descriptor_for;

// Re-export providers under `provider` module
#[cfg(feature = "conform-provider")]
pub mod provider {
    //! Model backend adapters.
    pub use conform_provider::*;
}

// Re-export layers under `layer` module
#[cfg(feature = "conform-layer")]
pub mod layer {
    //! Built-in provider layers.
    pub use conform_layer::*;
}

// Re-export schemars when schema feature is enabled
#[cfg(feature = "schema")]
pub mod schemars {
    pub use ::schemars::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude module containing the most commonly used types and traits.
    //!
    //! ```
    //! use conform::prelude::*;
    //! ```

    pub use crate::{
        ClientConfig, ConformError, FieldSpec, InvocationRequest, Layer, Message, ObjectSpec,
        Provider, Result, RetryPolicy, RuntimeExecutor, SchemaDescriptor, TerminalFailure,
        ValidatedResult, ValueSpec,
    };

    #[cfg(feature = "schema")]
    pub use crate::descriptor_for;

    #[cfg(feature = "conform-provider")]
    pub use crate::provider::*;

    #[cfg(feature = "conform-layer")]
    pub use crate::layer::*;
}

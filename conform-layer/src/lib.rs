//! # Conform Layers
//!
//! Built-in layers for Conform providers.
//!
//! Layers see one backend call at a time and never retry; retrying is the
//! runtime's job.
//!
//! Currently implemented layers:
//! - `LoggingLayer`: Logs all provider operations with timing information
//! - `TimeoutLayer`: Bounds each backend call, reporting overruns as transport errors
//!
//! ## Usage
//!
//! ```ignore
//! use conform_core::RuntimeExecutor;
//! use conform_layer::{LoggingLayer, TimeoutLayer};
//!
//! let executor = RuntimeExecutor::builder(provider)
//!     .layer(LoggingLayer::new())
//!     .layer(TimeoutLayer::new(Duration::from_secs(30)))
//!     .finish();
//! ```

pub mod logging;
pub mod timeout;

#[cfg(test)]
mod testing;

// Re-exports
pub use logging::{LoggingLayer, LoggingProvider};
pub use timeout::{TimeoutLayer, TimeoutProvider};

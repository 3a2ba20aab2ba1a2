//! Runtime execution.

pub mod executor;

pub use executor::{RuntimeExecutor, RuntimeExecutorBuilder};

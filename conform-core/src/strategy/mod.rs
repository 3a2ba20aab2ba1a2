//! Strategy layer for provider-specific behaviors.
//!
//! Backends differ in how they can be asked for JSON (JSON Schema, JSON
//! object mode, or nothing at all).

pub mod json_output;

pub use json_output::{
    detect_json_strategy, JsonModeStrategy, JsonOutputStrategy, JsonSchemaStrategy,
    PromptOnlyStrategy,
};

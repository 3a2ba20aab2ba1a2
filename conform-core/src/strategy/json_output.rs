//! JSON output strategies for different providers.
//!
//! The schema instruction is always part of the prompt. A strategy
//! additionally switches on whatever native JSON mode the backend offers:
//! - JsonSchemaStrategy: backends that accept a JSON Schema response format (OpenAI)
//! - JsonModeStrategy: backends that only support a basic JSON object mode (DeepSeek)

use crate::schema::SchemaDescriptor;
use crate::types::{ChatCompletionRequest, ResponseFormat};

/// Strategy for requesting JSON output from a backend.
pub trait JsonOutputStrategy: Send + Sync + std::fmt::Debug {
    /// Get the strategy name for debugging
    fn name(&self) -> &str;

    /// Set the response format on a request for `schema`.
    fn apply(&self, req: &mut ChatCompletionRequest, schema: &SchemaDescriptor);
}

/// JSON Schema strategy for backends that support schema-constrained output.
///
/// Strict mode is off by default: strict backends require every field to be
/// required and closed, which optional fields and defaults violate.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaStrategy {
    /// Whether to enable strict mode
    pub strict: bool,
}

impl JsonSchemaStrategy {
    /// Create a new JSON Schema strategy with strict mode disabled
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Create a new JSON Schema strategy with configurable strict mode
    pub fn with_strict(strict: bool) -> Self {
        Self { strict }
    }
}

impl JsonOutputStrategy for JsonSchemaStrategy {
    fn name(&self) -> &str {
        "JsonSchemaStrategy"
    }

    fn apply(&self, req: &mut ChatCompletionRequest, schema: &SchemaDescriptor) {
        req.response_format = Some(ResponseFormat::JsonSchema {
            name: schema_name(schema),
            schema: schema.render(),
            strict: self.strict,
        });
    }
}

/// JSON Mode strategy for backends that only support a JSON object mode.
#[derive(Debug, Clone, Default)]
pub struct JsonModeStrategy;

impl JsonModeStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl JsonOutputStrategy for JsonModeStrategy {
    fn name(&self) -> &str {
        "JsonModeStrategy"
    }

    fn apply(&self, req: &mut ChatCompletionRequest, _schema: &SchemaDescriptor) {
        req.response_format = Some(ResponseFormat::JsonObject);
    }
}

/// Leaves the response format unset; the prompt alone asks for JSON.
#[derive(Debug, Clone, Default)]
pub struct PromptOnlyStrategy;

impl JsonOutputStrategy for PromptOnlyStrategy {
    fn name(&self) -> &str {
        "PromptOnlyStrategy"
    }

    fn apply(&self, req: &mut ChatCompletionRequest, _schema: &SchemaDescriptor) {
        req.response_format = None;
    }
}

/// Schema names sent to backends are limited to `[a-zA-Z0-9_-]`.
fn schema_name(schema: &SchemaDescriptor) -> String {
    let name: String = schema
        .name()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .take(64)
        .collect();
    if name.is_empty() {
        "response".to_string()
    } else {
        name
    }
}

/// Auto-detect the appropriate JSON output strategy for a provider.
pub fn detect_json_strategy(provider_id: &str) -> Box<dyn JsonOutputStrategy> {
    match provider_id {
        // Providers that support JSON Schema
        "openai" | "azure" => Box::new(JsonSchemaStrategy::new()),

        // Providers that only support basic JSON mode
        "deepseek" => Box::new(JsonModeStrategy::new()),

        // Unknown providers get no native mode; the prompt carries the schema
        _ => Box::new(PromptOnlyStrategy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use crate::types::Message;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::builder("person info")
            .field(FieldSpec::string("name"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_json_schema_strategy() {
        let strategy = JsonSchemaStrategy::new();
        let mut req = ChatCompletionRequest::new("test-model", vec![Message::user("Hello")]);

        strategy.apply(&mut req, &schema());

        match req.response_format {
            Some(ResponseFormat::JsonSchema {
                name,
                schema: s,
                strict,
            }) => {
                assert_eq!(name, "person_info");
                assert_eq!(s, schema().render());
                assert!(!strict);
            }
            _ => panic!("Expected JsonSchema response format"),
        }
    }

    #[test]
    fn test_json_mode_strategy() {
        let mut req = ChatCompletionRequest::new("test-model", vec![Message::user("Hello")]);
        JsonModeStrategy::new().apply(&mut req, &schema());

        assert_eq!(req.response_format, Some(ResponseFormat::JsonObject));
        assert_eq!(req.messages.len(), 1);
    }

    #[test]
    fn test_detect_json_strategy() {
        assert_eq!(detect_json_strategy("openai").name(), "JsonSchemaStrategy");
        assert_eq!(detect_json_strategy("deepseek").name(), "JsonModeStrategy");
        assert_eq!(detect_json_strategy("unknown").name(), "PromptOnlyStrategy");
    }
}

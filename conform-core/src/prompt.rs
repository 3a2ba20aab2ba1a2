//! Prompt assembly.
//!
//! Combines the caller's task prompt with the schema rendering into the
//! messages sent on every attempt. Assembly happens once per invocation.

use crate::schema::SchemaDescriptor;
use crate::types::Message;

/// Instruction payload sent to the backend, identical across attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionPayload {
    pub messages: Vec<Message>,
}

/// Builds instruction payloads from a task prompt and a schema.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    /// Whether to send the schema instruction as a system message (true) or
    /// append it to the user message (false)
    pub use_system_message: bool,
}

impl PromptAssembler {
    /// Create an assembler that puts the schema instruction in a system message
    pub fn new() -> Self {
        Self {
            use_system_message: true,
        }
    }

    /// Create an assembler with configurable instruction placement
    pub fn with_system_message(use_system_message: bool) -> Self {
        Self { use_system_message }
    }

    /// Build the instruction text for a schema
    pub fn instruction(schema: &SchemaDescriptor) -> String {
        format!(
            "You must respond with a single JSON object that conforms to the `{}` schema below:\n\
            ```json\n{}\n```\n\nIMPORTANT:\n\
            1. Only return the JSON object, nothing else\n\
            2. Do not add explanations, commentary or markdown formatting\n\
            3. Include every required field and respect every constraint\n\
            4. Use the exact field names and data types from the schema",
            schema.name(),
            schema.rendered()
        )
    }

    pub fn assemble(&self, task_prompt: &str, schema: &SchemaDescriptor) -> InstructionPayload {
        let instruction = Self::instruction(schema);
        let messages = if self.use_system_message {
            vec![Message::system(instruction), Message::user(task_prompt)]
        } else {
            vec![Message::user(format!("{task_prompt}\n\n{instruction}"))]
        };
        InstructionPayload { messages }
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use crate::types::Role;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::builder("verdict")
            .field(FieldSpec::boolean("approved"))
            .field(FieldSpec::number("confidence").range(0.0, 1.0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_system_message_placement() {
        let payload = PromptAssembler::new().assemble("Review this PR", &schema());

        assert_eq!(payload.messages.len(), 2);
        assert_eq!(payload.messages[0].role, Role::System);
        assert!(payload.messages[0].content.contains(schema().rendered()));
        assert!(payload.messages[0].content.contains("Only return the JSON object"));
        assert_eq!(payload.messages[1], Message::user("Review this PR"));
    }

    #[test]
    fn test_user_message_placement() {
        let payload =
            PromptAssembler::with_system_message(false).assemble("Review this PR", &schema());

        assert_eq!(payload.messages.len(), 1);
        assert_eq!(payload.messages[0].role, Role::User);
        assert!(payload.messages[0].content.starts_with("Review this PR\n\n"));
        assert!(payload.messages[0].content.contains("\"confidence\""));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let assembler = PromptAssembler::new();
        assert_eq!(
            assembler.assemble("x", &schema()),
            assembler.assemble("x", &schema())
        );
    }
}

//! Tool call validation
//!
//! Pure checks of a [`ToolCall`] against its [`ToolDefinition`], with no
//! access to task data. Ordering and authorization preconditions depend on
//! the call history and are enforced by the tool mediator.

use super::entities::{ToolCall, ToolDefinition};
use super::value_objects::ToolError;

/// Validator for tool calls
pub trait ToolValidator {
    /// Validate a tool call against its definition
    fn validate(&self, call: &ToolCall, definition: &ToolDefinition) -> Result<(), ToolError>;
}

/// Checks required presence, unknown arguments, JSON types and value domains
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator;

impl ToolValidator for SchemaValidator {
    fn validate(&self, call: &ToolCall, definition: &ToolDefinition) -> Result<(), ToolError> {
        for param in &definition.parameters {
            if param.required && !call.arguments.contains_key(&param.name) {
                return Err(ToolError::invalid_args(format!(
                    "Missing required parameter '{}' for tool '{}'",
                    param.name, definition.name
                )));
            }
        }

        let mut names: Vec<&String> = call.arguments.keys().collect();
        names.sort();
        for name in names {
            let value = &call.arguments[name];
            let Some(param) = definition.parameter(name) else {
                return Err(ToolError::invalid_args(format!(
                    "Unknown parameter '{}' for tool '{}'",
                    name, definition.name
                )));
            };
            if !param.param_type.accepts(value) {
                return Err(ToolError::invalid_args(format!(
                    "Parameter '{}' must be {}, got {}",
                    name, param.param_type, value
                )));
            }
            if let Some(allowed) = &param.allowed_values
                && !allowed.contains(value)
            {
                return Err(ToolError::invalid_args(format!(
                    "Parameter '{}' has value {} outside its allowed values",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

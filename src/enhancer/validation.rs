//! Input validation, run before any network resource is touched

use serde_json::Value;

use crate::error::{ValidationError, MAX_PROMPT_CHARS};

/// Validate raw prompt text, passing it through unchanged on success
pub fn validate_prompt(text: &str) -> Result<&str, ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    // Count characters, not bytes, so multi-byte prompts get the same budget
    if text.chars().count() > MAX_PROMPT_CHARS {
        return Err(ValidationError::TooLong);
    }
    Ok(text)
}

/// Validate an untyped JSON value (the `prompt` field of a request body)
pub fn validate_prompt_value(value: Option<&Value>) -> Result<&str, ValidationError> {
    match value {
        Some(Value::String(text)) => validate_prompt(text),
        _ => Err(ValidationError::NotText),
    }
}

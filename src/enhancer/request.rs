//! Enhancement request builder
//!
//! Produces the two-message chat exchange sent upstream: the fixed rewriting
//! instruction followed by the user's prompt.

use serde::{Deserialize, Serialize};

use crate::config::EnhancerConfig;

/// System instruction describing the rewriting task
pub const ENHANCEMENT_SYSTEM_PROMPT: &str = r#"You are a prompt enhancement specialist. Your job is to take user prompts and make them clearer, more detailed, and better structured for AI code generation.

When enhancing prompts, you should:
1. Add missing context (programming language, framework, libraries)
2. Clarify vague requirements
3. Structure the request logically
4. Add expected output format details
5. Include error handling requirements if applicable
6. Make assumptions explicit
7. Add relevant constraints or best practices

Keep the enhanced prompt focused and actionable. Don't make it unnecessarily long, but ensure it's comprehensive enough for high-quality AI responses.

Return only the enhanced prompt text, nothing else."#;

/// Prefix of the user message; the prompt follows verbatim
pub const USER_MESSAGE_PREFIX: &str = "Please enhance this prompt:\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Outbound chat completion request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancementRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl EnhancementRequest {
    /// Build the request for already validated prompt text
    pub fn build(prompt_text: &str, config: &EnhancerConfig) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: ENHANCEMENT_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: render_user_message(prompt_text),
                },
            ],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// The original prompt text, recovered from the user message
    pub fn prompt_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .and_then(|m| m.content.strip_prefix(USER_MESSAGE_PREFIX))
    }
}

/// Concatenate rather than substitute so user text containing template-like
/// markers is never rewritten
fn render_user_message(prompt_text: &str) -> String {
    let mut rendered = String::with_capacity(USER_MESSAGE_PREFIX.len() + prompt_text.len());
    rendered.push_str(USER_MESSAGE_PREFIX);
    rendered.push_str(prompt_text);
    rendered
}

//! Prompt Enhancer module
//! Validates raw prompts, builds the upstream request and runs the enhancement

pub mod context;
pub mod prompt_enhancer;
pub mod request;
pub mod validation;

pub use context::{NoProgress, OperationContext, ProgressSink};
pub use prompt_enhancer::{format_timestamp, preview, Enhance, EnhancementResult, PromptEnhancer};
pub use request::{ChatMessage, EnhancementRequest, Role, ENHANCEMENT_SYSTEM_PROMPT};
pub use validation::{validate_prompt, validate_prompt_value};

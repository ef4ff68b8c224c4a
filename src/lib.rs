//! prompt-enhancer library - rewrites raw prompts into clearer, structured
//! prompts through an LLM completion API

pub mod config;
pub mod enhancer;
pub mod error;
pub mod http_logger;
pub mod interactive;
pub mod server;
pub mod service;

// Re-export commonly used types
pub use config::{Backend, CliOverrides, EnhancerConfig, ServiceConfig};
pub use enhancer::{EnhancementResult, OperationContext, PromptEnhancer};
pub use error::{EnhanceError, ValidationError};

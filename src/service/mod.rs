//! Upstream clients: the completion API and the enhancement service

pub mod common;
pub(crate) mod openai;
pub(crate) mod proxy;

pub use common::{build_openai_url, build_service_url, parse_error_body, ApiErrorDetail};
pub use openai::OpenAiClient;
pub use proxy::ServiceClient;

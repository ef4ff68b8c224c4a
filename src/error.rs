//! Error taxonomy for prompt enhancement
//!
//! Every failure the core can produce is one variant of [`EnhanceError`]. The
//! `Display` text of each variant is the message shown to the end user, so
//! front-ends never need to inspect error strings.

use thiserror::Error;

/// Maximum prompt length, in characters
pub const MAX_PROMPT_CHARS: usize = 5000;

/// Input rejected before any network call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Prompt missing or not a string value
    #[error("Prompt is required and must be a string")]
    NotText,
    /// Prompt blank after trimming
    #[error("Prompt cannot be empty")]
    EmptyInput,
    /// Prompt longer than [`MAX_PROMPT_CHARS`]
    #[error("Prompt is too long (max {MAX_PROMPT_CHARS} characters)")]
    TooLong,
}

/// Errors produced by a prompt enhancement
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnhanceError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("OpenAI API key not configured. Please set OPENAI_API_KEY environment variable.")]
    Configuration,

    #[error("Invalid OpenAI API key")]
    Auth,

    #[error("OpenAI API quota exceeded. Please check your billing.")]
    Quota,

    #[error("OpenAI API rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("OpenAI model not available")]
    ModelUnavailable,

    #[error("Request timeout. Please try again.")]
    Timeout,

    #[error("Network error. Please check your internet connection.")]
    Network,

    #[error("No enhanced prompt received from OpenAI")]
    EmptyCompletion,

    /// Fallback for upstream failures with no more specific category
    #[error("{message}")]
    Upstream {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The caller cancelled the operation; front-ends abort silently
    #[error("Enhancement cancelled")]
    Cancelled,
}

impl EnhanceError {
    /// HTTP status the service reports for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Timeout => 408,
            _ => 500,
        }
    }

    /// Stable category tag carried in service error responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Configuration => "configuration_error",
            Self::Auth => "auth_error",
            Self::Quota => "quota_error",
            Self::RateLimited => "rate_limited",
            Self::ModelUnavailable => "model_unavailable",
            Self::Timeout => "timeout",
            Self::Network => "network_error",
            Self::EmptyCompletion => "empty_completion",
            Self::Upstream { .. } => "upstream_error",
            Self::Cancelled => "cancelled",
        }
    }

    /// Rebuild an error from a service error response (`code` is the tag
    /// written by [`EnhanceError::code`])
    pub fn from_service(status: u16, code: Option<&str>, message: &str) -> Self {
        match code {
            Some("configuration_error") => Self::Configuration,
            Some("auth_error") => Self::Auth,
            Some("quota_error") => Self::Quota,
            Some("rate_limited") => Self::RateLimited,
            Some("model_unavailable") => Self::ModelUnavailable,
            Some("timeout") => Self::Timeout,
            Some("network_error") => Self::Network,
            Some("empty_completion") => Self::EmptyCompletion,
            _ if status == 408 => Self::Timeout,
            _ => Self::Upstream {
                status,
                code: code.map(str::to_string),
                message: message.to_string(),
            },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Map a structured upstream failure onto a category.
    ///
    /// `code` and `kind` are the `error.code` / `error.type` fields of an
    /// OpenAI-style error body, when present.
    pub fn from_upstream(
        status: u16,
        code: Option<&str>,
        kind: Option<&str>,
        message: Option<&str>,
    ) -> Self {
        let tag = code.or(kind);
        match (status, tag) {
            (_, Some("insufficient_quota")) => Self::Quota,
            (_, Some("invalid_api_key")) | (401, _) | (403, _) => Self::Auth,
            (_, Some("model_not_found")) => Self::ModelUnavailable,
            (429, _) => Self::RateLimited,
            (408, _) | (504, _) => Self::Timeout,
            _ => Self::Upstream {
                status,
                code: tag.map(str::to_string),
                message: format!(
                    "OpenAI API error ({}): {}",
                    status,
                    message
                        .filter(|m| !m.trim().is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(|| default_reason(status))
                ),
            },
        }
    }
}

impl From<reqwest::Error> for EnhanceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() || e.is_request() {
            Self::Network
        } else if let Some(status) = e.status() {
            Self::from_upstream(status.as_u16(), None, None, None)
        } else {
            Self::Network
        }
    }
}

fn default_reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown error")
        .to_string()
}

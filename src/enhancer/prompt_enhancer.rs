//! Prompt Enhancer - validate, build, call
//!
//! The backend that talks to the network is chosen by [`Backend`]:
//! - `direct`: calls the OpenAI chat completions API
//! - `service`: proxies through a running enhancement service

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};

use crate::config::{Backend, EnhancerConfig};
use crate::error::EnhanceError;
use crate::service::{OpenAiClient, ServiceClient};

use super::context::OperationContext;
use super::validation::validate_prompt;

/// A backend able to turn validated prompt text into enhanced text
#[async_trait]
pub trait Enhance: Send + Sync {
    async fn enhance(
        &self,
        prompt: &str,
        ctx: &OperationContext<'_>,
    ) -> Result<String, EnhanceError>;
}

/// Outcome of one enhancement, returned to the caller and discarded
#[derive(Debug, Clone)]
pub struct EnhancementResult {
    pub original_prompt: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    outcome: Result<String, EnhanceError>,
}

impl EnhancementResult {
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Present iff the enhancement succeeded
    pub fn enhanced_text(&self) -> Option<&str> {
        self.outcome.as_ref().ok().map(String::as_str)
    }

    /// Present iff the enhancement failed
    pub fn error(&self) -> Option<&EnhanceError> {
        self.outcome.as_ref().err()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    pub fn into_result(self) -> Result<String, EnhanceError> {
        self.outcome
    }
}

/// Format a timestamp the way every response reports it
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Prompt Enhancer
#[derive(Clone)]
pub struct PromptEnhancer {
    backend: Arc<dyn Enhance>,
}

impl PromptEnhancer {
    /// Create an enhancer with the backend selected by the configuration
    pub fn new(config: &EnhancerConfig) -> anyhow::Result<Self> {
        let backend: Arc<dyn Enhance> = match config.backend {
            Backend::Direct => Arc::new(OpenAiClient::new(config)?),
            Backend::Service => Arc::new(ServiceClient::new(config)?),
        };
        Ok(Self { backend })
    }

    pub fn with_backend(backend: Arc<dyn Enhance>) -> Self {
        Self { backend }
    }

    /// Enhance raw prompt text.
    ///
    /// Validation runs first; an invalid prompt never reaches the backend.
    /// Cancellation races the backend call and is checked again once it
    /// returns, so a cancelled call never yields text.
    pub async fn enhance(
        &self,
        raw_prompt: &str,
        ctx: &OperationContext<'_>,
    ) -> Result<String, EnhanceError> {
        let prompt = validate_prompt(raw_prompt)?;

        info!("Enhancing prompt: \"{}\"", preview(prompt, 100));

        let result = tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(EnhanceError::Cancelled),
            result = self.backend.enhance(prompt, ctx) => result,
        };

        if ctx.is_cancelled() {
            info!("Enhancement cancelled by caller");
            return Err(EnhanceError::Cancelled);
        }

        match &result {
            Ok(enhanced) => info!(
                "Enhancement completed. Original length: {}, Enhanced length: {}",
                prompt.chars().count(),
                enhanced.chars().count()
            ),
            Err(e) => warn!("Enhancement failed: {}", e),
        }

        result
    }

    /// Run an enhancement and capture the outcome with timestamps
    pub async fn run(&self, raw_prompt: &str, ctx: &OperationContext<'_>) -> EnhancementResult {
        let started_at = Utc::now();
        let outcome = self.enhance(raw_prompt, ctx).await;
        EnhancementResult {
            original_prompt: raw_prompt.to_string(),
            started_at,
            finished_at: Utc::now(),
            outcome,
        }
    }
}

/// First `max` characters of `text`, with an ellipsis when cut
pub fn preview(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

//! OpenAI chat completions client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::common::{build_openai_url, parse_error_body, send_logged};
use crate::config::EnhancerConfig;
use crate::enhancer::{Enhance, EnhancementRequest, OperationContext};
use crate::error::EnhanceError;

/// OpenAI API response structure
#[derive(Debug, Deserialize)]
struct OpenAIApiResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    #[serde(default)]
    message: Option<OpenAIResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completion client calling the upstream API directly
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    config: EnhancerConfig,
}

impl OpenAiClient {
    pub fn new(config: &EnhancerConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config.clone()))
    }

    /// Reuse an existing HTTP client (the service shares one across requests)
    pub fn with_client(client: Client, config: EnhancerConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    /// Send a built request and extract the first choice's trimmed text
    pub async fn complete(
        &self,
        api_key: &str,
        request: &EnhancementRequest,
        ctx: &OperationContext<'_>,
    ) -> Result<String, EnhanceError> {
        let url = build_openai_url(&self.config.base_url);
        let request_id = Uuid::new_v4();
        let start_time = Instant::now();

        info!("Calling OpenAI API: {} (model {}, request {})", url, request.model, request_id);

        let builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(request);

        let response = send_logged(builder, &url, api_key, request).await;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!("OpenAI API call completed in {}ms", duration_ms);

        let (status, body_text) = match response {
            Ok(parts) => parts,
            Err(e) => {
                warn!("OpenAI API request failed: {}", e);
                return Err(EnhanceError::from(e));
            }
        };

        ctx.report(60, "Processing response...");
        debug!("OpenAI response status {}, {} bytes", status, body_text.len());

        if !status.is_success() {
            let detail = parse_error_body(&body_text);
            warn!("OpenAI API failed: {} - {}", status, body_text);
            return Err(EnhanceError::from_upstream(
                status.as_u16(),
                detail.code.as_deref(),
                detail.kind.as_deref(),
                detail.message.as_deref(),
            ));
        }

        extract_completion_text(status.as_u16(), &body_text)
    }
}

#[async_trait]
impl Enhance for OpenAiClient {
    async fn enhance(
        &self,
        prompt: &str,
        ctx: &OperationContext<'_>,
    ) -> Result<String, EnhanceError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(EnhanceError::Configuration)?;

        let request = EnhancementRequest::build(prompt, &self.config);
        self.complete(api_key, &request, ctx).await
    }
}

/// Pull the first choice's message text out of a successful response body
fn extract_completion_text(status: u16, body_text: &str) -> Result<String, EnhanceError> {
    let api_response: OpenAIApiResponse =
        serde_json::from_str(body_text).map_err(|e| EnhanceError::Upstream {
            status,
            code: None,
            message: format!("Failed to parse OpenAI response: {}", e),
        })?;

    api_response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(EnhanceError::EmptyCompletion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_trims() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  foo \n"}}]}"#;
        assert_eq!(extract_completion_text(200, body).unwrap(), "foo");
    }

    #[test]
    fn test_extract_uses_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"first"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(extract_completion_text(200, body).unwrap(), "first");
    }

    #[test]
    fn test_extract_empty_variants() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"content":"   "}}]}"#,
        ] {
            assert_eq!(
                extract_completion_text(200, body),
                Err(EnhanceError::EmptyCompletion),
                "body: {}",
                body
            );
        }
    }

    #[test]
    fn test_extract_invalid_json() {
        let err = extract_completion_text(200, "not json").unwrap_err();
        assert!(matches!(err, EnhanceError::Upstream { status: 200, .. }));
    }
}

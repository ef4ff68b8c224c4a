//! Client for a running enhancement service (`POST /api/enhance`)

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::common::{build_service_url, send_logged};
use crate::config::EnhancerConfig;
use crate::enhancer::{Enhance, OperationContext};
use crate::error::EnhanceError;

#[derive(Debug, Serialize)]
struct ServiceRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    enhanced_prompt: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Enhancement backend that proxies through the HTTP service
#[derive(Clone)]
pub struct ServiceClient {
    client: Client,
    endpoint: String,
}

impl ServiceClient {
    pub fn new(config: &EnhancerConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, &config.service_url))
    }

    pub fn with_client(client: Client, service_url: &str) -> Self {
        Self {
            client,
            endpoint: build_service_url(service_url),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Enhance for ServiceClient {
    async fn enhance(
        &self,
        prompt: &str,
        ctx: &OperationContext<'_>,
    ) -> Result<String, EnhanceError> {
        let payload = ServiceRequest { prompt };
        let start_time = Instant::now();

        info!("Calling enhancement service: {}", self.endpoint);

        let builder = self.client.post(&self.endpoint).json(&payload);
        let (status, body_text) = send_logged(builder, &self.endpoint, "", &payload)
            .await
            .map_err(|e| {
                warn!("Enhancement service request failed: {}", e);
                EnhanceError::from(e)
            })?;

        info!(
            "Enhancement service call completed in {}ms",
            start_time.elapsed().as_millis()
        );
        ctx.report(60, "Processing response...");

        let parsed: Option<ServiceResponse> = serde_json::from_str(&body_text).ok();

        match parsed {
            Some(resp) if status.is_success() && resp.success => resp
                .enhanced_prompt
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .ok_or(EnhanceError::EmptyCompletion),
            Some(resp) => Err(EnhanceError::from_service(
                status.as_u16(),
                resp.code.as_deref(),
                resp.error.as_deref().unwrap_or("Unknown error occurred"),
            )),
            None => Err(EnhanceError::Upstream {
                status: status.as_u16(),
                code: None,
                message: format!("Enhancement service error ({}): {}", status, body_text),
            }),
        }
    }
}

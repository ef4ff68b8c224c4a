//! Common helpers for upstream service calls

use std::time::Instant;

use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::http_logger::{self, Exchange, Outcome};

/// `error` object of an OpenAI-style error response
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

/// Parse an upstream error body; unknown shapes yield an empty detail
pub fn parse_error_body(body: &str) -> ApiErrorDetail {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_default()
}

/// Chat completions URL for a base URL with or without `/v1`
pub fn build_openai_url(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    let base_url = base_url.strip_suffix("/v1").unwrap_or(base_url);
    format!("{}/v1/chat/completions", base_url)
}

/// Enhancement endpoint of a running service
pub fn build_service_url(service_url: &str) -> String {
    format!("{}/api/enhance", service_url.trim_end_matches('/'))
}

/// Send a JSON POST and read the whole body, recording the exchange in the
/// HTTP log when enabled
pub(crate) async fn send_logged<T: Serialize>(
    builder: RequestBuilder,
    url: &str,
    credential: &str,
    body: &T,
) -> Result<(StatusCode, String), reqwest::Error> {
    let start_time = Instant::now();

    let result = async {
        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        Ok::<_, reqwest::Error>((status, text))
    }
    .await;

    if http_logger::is_enabled() {
        let request_body = serde_json::to_string(body).unwrap_or_default();
        let error_text = result.as_ref().err().map(ToString::to_string);
        let outcome = match &result {
            Ok((status, text)) => Outcome::Response {
                status: status.as_u16(),
                body: text,
            },
            Err(_) => Outcome::Failed(error_text.as_deref().unwrap_or_default()),
        };
        http_logger::record(&Exchange {
            url,
            credential,
            request_body: &request_body,
            outcome,
            duration_ms: start_time.elapsed().as_millis() as u64,
        });
    }

    result
}

//! Enhancement Server - standalone HTTP front-end
//!
//! Routes:
//! - `GET /health`
//! - `POST /api/enhance` with body `{"prompt": "..."}`
//!
//! Every request is handled independently; the only shared value is the
//! immutable [`ServiceState`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use futures::FutureExt;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{Backend, EnhancerConfig, ServiceConfig, ENV_API_KEY};
use crate::enhancer::{format_timestamp, validate_prompt_value, OperationContext, PromptEnhancer};
use crate::error::EnhanceError;
use crate::service::OpenAiClient;

/// Maximum request body size (10MB)
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Shared, read-only state of a running service
pub struct ServiceState {
    pub config: EnhancerConfig,
    enhancer: PromptEnhancer,
}

impl ServiceState {
    /// The service always calls the completion API directly
    pub fn new(config: EnhancerConfig) -> Result<Self> {
        let config = EnhancerConfig {
            backend: Backend::Direct,
            ..config
        };
        let client = OpenAiClient::new(&config)?;
        Ok(Self {
            enhancer: PromptEnhancer::with_backend(Arc::new(client)),
            config,
        })
    }

    pub fn with_enhancer(config: EnhancerConfig, enhancer: PromptEnhancer) -> Self {
        Self { config, enhancer }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct EnhanceResponse {
    success: bool,
    enhanced_prompt: String,
    original_prompt: String,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

/// Bind the configured address and serve until SIGINT/SIGTERM
pub async fn run(config: EnhancerConfig, service: ServiceConfig) -> Result<()> {
    let addr = service.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow!("Failed to bind to {}: {}", addr, e))?;
    let local_addr = listener.local_addr()?;

    info!(
        "Prompt enhancer service running on http://localhost:{}",
        local_addr.port()
    );
    info!("Health check: http://localhost:{}/health", local_addr.port());
    info!(
        "Enhance endpoint: http://localhost:{}/api/enhance",
        local_addr.port()
    );

    if config.has_api_key() {
        info!("OpenAI API key configured");
    } else {
        warn!(
            "{} not set! Enhancement requests will fail until it is configured.",
            ENV_API_KEY
        );
    }

    let state = Arc::new(ServiceState::new(config)?);
    serve(listener, state, shutdown_signal()).await
}

/// Accept connections on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<ServiceState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down server gracefully...");
                return Ok(());
            }
            conn = listener.accept() => match conn {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            },
        };

        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(req, state, peer).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                if !e.to_string().contains("connection closed") {
                    error!("Error serving connection: {}", e);
                }
            }
        });
    }
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Handle HTTP request; internal failures and panics become a 500
async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ServiceState>,
    peer: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let outcome = AssertUnwindSafe(route(req, &state)).catch_unwind().await;

    let response = match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            error!("Unhandled error ({}): {}", request_id, e);
            internal_error_response()
        }
        Err(_) => {
            error!("Request handler panicked ({})", request_id);
            internal_error_response()
        }
    };

    info!(
        "{} {} {} -> {} ({})",
        peer,
        method,
        path,
        response.status().as_u16(),
        request_id
    );
    Ok(cors_response(response))
}

async fn route(req: Request<Incoming>, state: &ServiceState) -> Result<Response<Full<Bytes>>> {
    if req.method() == Method::OPTIONS {
        return Ok(empty_response(StatusCode::NO_CONTENT));
    }

    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/health") => health_response(),
        (&Method::POST, "/api/enhance") => handle_enhance(req, state).await?,
        _ => error_response(StatusCode::NOT_FOUND, "Endpoint not found", None),
    };
    Ok(response)
}

fn health_response() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            status: "healthy",
            timestamp: format_timestamp(Utc::now()),
        },
    )
}

/// Handle `POST /api/enhance`
async fn handle_enhance(
    req: Request<Incoming>,
    state: &ServiceState,
) -> Result<Response<Full<Bytes>>> {
    let body = match read_body_with_limit(req, MAX_BODY_SIZE).await {
        Ok(b) => b,
        Err(BodyError::TooLarge) => {
            return Ok(error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large",
                None,
            ));
        }
        Err(BodyError::Read(e)) => return Err(anyhow!("Failed to read body: {}", e)),
    };

    let payload: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(_) => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    "Invalid JSON body",
                    None,
                ));
            }
        }
    };

    let prompt = match validate_prompt_value(payload.get("prompt")) {
        Ok(prompt) => prompt,
        Err(e) => return Ok(enhance_error_response(&e.into())),
    };

    let result = state
        .enhancer
        .run(prompt, &OperationContext::detached())
        .await;

    let response = match result.error() {
        None => json_response(
            StatusCode::OK,
            &EnhanceResponse {
                success: true,
                enhanced_prompt: result.enhanced_text().unwrap_or_default().to_string(),
                original_prompt: result.original_prompt.clone(),
                timestamp: format_timestamp(result.finished_at),
            },
        ),
        Some(e) => {
            if !matches!(e, EnhanceError::Validation(_)) {
                error!("Enhancement error: {}", e);
            }
            enhance_error_response(e)
        }
    };
    Ok(response)
}

enum BodyError {
    TooLarge,
    Read(String),
}

/// Read request body with size limit (streaming enforcement)
async fn read_body_with_limit(
    req: Request<Incoming>,
    max_size: usize,
) -> std::result::Result<Bytes, BodyError> {
    let limited = Limited::new(req.into_body(), max_size);
    match limited.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) => {
            if e.downcast_ref::<http_body_util::LengthLimitError>().is_some() {
                Err(BodyError::TooLarge)
            } else {
                Err(BodyError::Read(e.to_string()))
            }
        }
    }
}

/// Add CORS headers
pub fn cors_response(mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    response
}

fn enhance_error_response(e: &EnhanceError) -> Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, &e.to_string(), Some(e.code()))
}

fn internal_error_response() -> Response<Full<Bytes>> {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
        None,
    )
}

fn error_response(
    status: StatusCode,
    error: &str,
    code: Option<&'static str>,
) -> Response<Full<Bytes>> {
    json_response(
        status,
        &ErrorResponse {
            success: false,
            error: error.to_string(),
            code,
        },
    )
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Create JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(body).unwrap_or_else(|e| {
        error!("Failed to serialize response: {}", e);
        br#"{"success":false,"error":"Internal server error"}"#.to_vec()
    });

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

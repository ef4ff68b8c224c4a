//! Tests for the service (proxy) backend
//! Uses wiremock for the service and, end to end, a real server instance

use std::sync::Arc;

use prompt_enhancer::config::{Backend, EnhancerConfig};
use prompt_enhancer::enhancer::{OperationContext, PromptEnhancer};
use prompt_enhancer::error::EnhanceError;
use prompt_enhancer::server::{self, ServiceState};
use prompt_enhancer::service::ServiceClient;
use serde_json::json;
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn proxy_config(service_url: &str) -> EnhancerConfig {
    EnhancerConfig {
        backend: Backend::Service,
        service_url: service_url.to_string(),
        ..Default::default()
    }
}

async fn enhance_via(service_url: &str, prompt: &str) -> Result<String, EnhanceError> {
    PromptEnhancer::new(&proxy_config(service_url))
        .unwrap()
        .enhance(prompt, &OperationContext::detached())
        .await
}

#[test]
fn test_endpoint_construction() {
    let client = ServiceClient::with_client(reqwest::Client::new(), "http://localhost:3000/");
    assert_eq!(client.endpoint(), "http://localhost:3000/api/enhance");
}

#[tokio::test]
async fn test_proxy_success_without_credential() {
    let service = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/enhance"))
        .and(body_json(json!({ "prompt": "make a todo app" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "enhanced_prompt": "  Create a todo application.  ",
            "original_prompt": "make a todo app",
            "timestamp": "2024-05-01T12:30:45.123Z"
        })))
        .expect(1)
        .mount(&service)
        .await;

    let result = enhance_via(&service.uri(), "make a todo app").await;
    assert_eq!(result.unwrap(), "Create a todo application.");

    let requests = service.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_proxy_rebuilds_error_category() {
    let service = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/enhance"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "error": "Invalid OpenAI API key",
            "code": "auth_error"
        })))
        .expect(1)
        .mount(&service)
        .await;

    let result = enhance_via(&service.uri(), "make a todo app").await;
    assert_eq!(result, Err(EnhanceError::Auth));
}

#[tokio::test]
async fn test_proxy_error_without_code_keeps_message() {
    let service = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/enhance"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "success": false,
            "error": "Something broke"
        })))
        .expect(1)
        .mount(&service)
        .await;

    let err = enhance_via(&service.uri(), "make a todo app")
        .await
        .unwrap_err();
    assert!(matches!(err, EnhanceError::Upstream { status: 500, .. }));
    assert_eq!(err.to_string(), "Something broke");
}

#[tokio::test]
async fn test_proxy_408_is_timeout() {
    let service = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/enhance"))
        .respond_with(ResponseTemplate::new(408).set_body_json(json!({
            "success": false,
            "error": "Request timeout. Please try again."
        })))
        .expect(1)
        .mount(&service)
        .await;

    let result = enhance_via(&service.uri(), "make a todo app").await;
    assert_eq!(result, Err(EnhanceError::Timeout));
}

#[tokio::test]
async fn test_proxy_non_json_response() {
    let service = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/enhance"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&service)
        .await;

    let err = enhance_via(&service.uri(), "make a todo app")
        .await
        .unwrap_err();
    assert!(matches!(err, EnhanceError::Upstream { status: 502, .. }));
    assert!(err.to_string().contains("bad gateway"));
}

#[tokio::test]
async fn test_proxy_validates_before_sending() {
    let service = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&service)
        .await;

    let err = enhance_via(&service.uri(), "  ").await.unwrap_err();
    assert_eq!(err.to_string(), "Prompt cannot be empty");
}

#[tokio::test]
async fn test_proxy_service_unreachable() {
    let result = enhance_via("http://127.0.0.1:1", "make a todo app").await;
    assert_eq!(result, Err(EnhanceError::Network));
}

#[tokio::test]
async fn test_proxy_through_running_service() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Enhanced via service" } }]
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let service_config = EnhancerConfig {
        api_key: Some("test-key".to_string()),
        base_url: upstream.uri(),
        ..Default::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(ServiceState::new(service_config).unwrap());
    tokio::spawn(server::serve(listener, state, std::future::pending()));

    let result = enhance_via(&format!("http://{}", addr), "make a todo app").await;
    assert_eq!(result.unwrap(), "Enhanced via service");
}

#[tokio::test]
async fn test_proxy_surfaces_service_configuration_error() {
    let service_config = EnhancerConfig {
        api_key: None,
        ..Default::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(ServiceState::new(service_config).unwrap());
    tokio::spawn(server::serve(listener, state, std::future::pending()));

    let result = enhance_via(&format!("http://{}", addr), "make a todo app").await;
    assert_eq!(result, Err(EnhanceError::Configuration));
}

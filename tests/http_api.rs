//! HTTP surface exercised in-process through the router.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::Fixture;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use gmail_send_server::http::{build_router, AppState};

fn router(fx: &Fixture) -> Router {
    let store = fx.store();
    let service = fx.service_with(store.clone());
    build_router(AppState::new(service, store))
}

async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

#[tokio::test]
async fn health_endpoints() {
    let fx = Fixture::new().await;

    let (status, body) = call(router(&fx), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "service": "gmail-send-server"}));

    let (status, body) = call(router(&fx), get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "email");

    let (status, body) = call(router(&fx), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoints"]["send_email"], "/api/v1/send-email");
}

#[tokio::test]
async fn send_email_success() {
    let fx = Fixture::new().await;
    fx.write_credentials();
    fx.write_token("ya29.current", 3600, true);

    Mock::given(method("POST"))
        .and(path("/users/me/messages/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc123"})))
        .expect(1)
        .mount(&fx.server)
        .await;

    let (status, body) = call(
        router(&fx),
        post_json(
            "/api/v1/send-email",
            json!({"to_email": "a@b.com", "subject": "Hi", "body": "Hello"}).to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "message": "Email sent successfully to a@b.com",
            "subject": "Hi",
            "message_id": "abc123"
        })
    );
}

#[tokio::test]
async fn send_email_invalid_address_is_422() {
    let fx = Fixture::new().await;

    let (status, body) = call(
        router(&fx),
        post_json(
            "/api/v1/send-email",
            json!({"to_email": "not-an-email", "subject": "Hi", "body": "Hello"}).to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid_address");
}

#[tokio::test]
async fn malformed_body_is_400() {
    let fx = Fixture::new().await;

    let (status, body) = call(router(&fx), post_json("/api/v1/send-email", "{oops")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn missing_token_is_503() {
    let fx = Fixture::new().await;
    fx.write_credentials();

    let (status, body) = call(
        router(&fx),
        post_json(
            "/api/v1/send-email",
            json!({"to_email": "a@b.com", "subject": "Hi", "body": "Hello"}).to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "missing_token");
}

#[tokio::test]
async fn provider_rejection_is_502() {
    let fx = Fixture::new().await;
    fx.write_credentials();
    fx.write_token("ya29.current", 3600, true);

    Mock::given(method("POST"))
        .and(path("/users/me/messages/send"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Invalid To header", "status": "INVALID_ARGUMENT"}
        })))
        .expect(1)
        .mount(&fx.server)
        .await;

    let (status, body) = call(
        router(&fx),
        post_json(
            "/api/v1/send-email",
            json!({"to_email": "a@b.com", "subject": "Hi", "body": "Hello"}).to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "send_failed");
    assert!(body["message"].as_str().unwrap().contains("Invalid To header"));
}

#[tokio::test]
async fn auth_status_endpoint() {
    let fx = Fixture::new().await;

    let (status, body) = call(router(&fx), get("/api/v1/auth/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["credentials_file_exists"], false);
    assert_eq!(body["instructions"].as_array().unwrap().len(), 5);

    fx.write_credentials();
    fx.write_token("ya29.current", 3600, true);

    let (_, body) = call(router(&fx), get("/api/v1/auth/status")).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["message"], "Authentication successful");
}

#[tokio::test]
async fn mcp_tools_list() {
    let fx = Fixture::new().await;

    let (status, body) = call(
        router(&fx),
        post_json(
            "/mcp",
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}).to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["tools"][0]["name"], "send_email");
}

#[tokio::test]
async fn mcp_tools_call_matches_http_error_shape() {
    let fx = Fixture::new().await;

    let (status, body) = call(
        router(&fx),
        post_json(
            "/mcp",
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": {
                    "name": "send_email",
                    "arguments": {"to_email": "not-an-email", "subject": "Hi", "body": "Hello"}
                }
            })
            .to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["isError"], true);

    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    let payload: Value = serde_json::from_str(text).unwrap();
    assert_eq!(payload["success"], false);
    assert_eq!(payload["error"], "invalid_address");
}

#[tokio::test]
async fn mcp_tools_call_sends() {
    let fx = Fixture::new().await;
    fx.write_credentials();
    fx.write_token("ya29.current", 3600, true);

    Mock::given(method("POST"))
        .and(path("/users/me/messages/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m-1"})))
        .expect(1)
        .mount(&fx.server)
        .await;

    let (_, body) = call(
        router(&fx),
        post_json(
            "/mcp",
            json!({
                "jsonrpc": "2.0",
                "id": 8,
                "method": "tools/call",
                "params": {
                    "name": "send_email",
                    "arguments": {"to_email": "a@b.com", "subject": "Hi", "body": "Hello", "is_html": false}
                }
            })
            .to_string(),
        ),
    )
    .await;

    assert!(body["result"].get("isError").is_none());
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    let payload: Value = serde_json::from_str(text).unwrap();
    assert_eq!(payload["success"], true);
    assert_eq!(payload["message"], "Email sent successfully to a@b.com");
    assert_eq!(payload["message_id"], "m-1");
}

#[tokio::test]
async fn mcp_notification_is_accepted_without_body() {
    let fx = Fixture::new().await;

    let (status, body) = call(
        router(&fx),
        post_json(
            "/mcp",
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body.is_null());
}

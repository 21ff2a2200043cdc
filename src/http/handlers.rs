//! HTTP request handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::AppState;
use crate::contract::{EmailRequest, EmailResult, ErrorResponse};
use crate::error::{ErrorCategory, GmailMcpError};
use crate::gmail::auth::AuthStatus;

/// Build all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/v1/health", get(email_health))
        .route("/api/v1/send-email", post(send_email))
        .route("/api/v1/auth/status", get(auth_status))
        .route("/mcp", post(mcp))
}

/// Error response carrying an HTTP status and the shared error body
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn malformed(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse::malformed(rejection.body_text()),
        }
    }
}

/// HTTP status for an error category
pub fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::InvalidAddress | ErrorCategory::ValidationError => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorCategory::MissingCredentialFile
        | ErrorCategory::MissingToken
        | ErrorCategory::RefreshFailed => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCategory::SendFailed => StatusCode::BAD_GATEWAY,
        ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<GmailMcpError> for ApiError {
    fn from(err: GmailMcpError) -> Self {
        let body = ErrorResponse::from(&err);
        Self {
            status: status_for(body.error),
            body,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Gmail Send Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "send_email": "/api/v1/send-email",
            "auth_status": "/api/v1/auth/status",
            "health": "/api/v1/health",
            "mcp": "/mcp"
        }
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "gmail-send-server" }))
}

async fn email_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "email" }))
}

async fn send_email(
    State(state): State<AppState>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<EmailResult>, ApiError> {
    let Json(request) = payload.map_err(ApiError::malformed)?;
    let result = state.service.send_email(&request).await?;
    Ok(Json(result))
}

async fn auth_status(State(state): State<AppState>) -> Json<AuthStatus> {
    Json(state.credentials.status().await)
}

/// Stateless MCP over HTTP: one JSON-RPC message in, one JSON response out.
async fn mcp(State(state): State<AppState>, body: String) -> Response {
    match state.mcp.handle_message(&body).await {
        Ok(Some(response)) => Json(response).into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

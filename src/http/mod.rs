//! HTTP entry point
//!
//! REST endpoints for sending email and checking authorization, plus the
//! MCP endpoint mounted at `/mcp`.

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::gmail::auth::CredentialStore;
use crate::mcp::server::McpServer;
use crate::service::EmailService;

/// Shared state accessible by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Validation + send path
    pub service: Arc<EmailService>,
    /// Credential diagnostics
    pub credentials: Arc<CredentialStore>,
    /// MCP request handling
    pub mcp: Arc<McpServer>,
}

impl AppState {
    pub fn new(service: Arc<EmailService>, credentials: Arc<CredentialStore>) -> Self {
        let mcp = Arc::new(McpServer::new(service.clone()));
        Self {
            service,
            credentials,
            mcp,
        }
    }
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);
    tracing::info!("MCP server mounted at /mcp");

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

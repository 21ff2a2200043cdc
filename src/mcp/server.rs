//! MCP Server implementation
//!
//! Handles JSON-RPC messages for both the stdio transport and the stateless
//! HTTP mount.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::Result;
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;
use crate::service::EmailService;

/// MCP Server info
const SERVER_NAME: &str = "gmail-send-server";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const INSTRUCTIONS: &str = "Sends email through the authorized Gmail account. \
    Call send_email with to_email, subject and body; set is_html for HTML bodies.";

/// MCP Server for sending email
pub struct McpServer {
    /// Tool handler
    tool_handler: ToolHandler,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(service: Arc<EmailService>) -> Self {
        Self {
            tool_handler: ToolHandler::new(service),
        }
    }

    /// Run the server on stdio, one JSON message per line
    pub async fn run_stdio(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            match self.handle_message(&line).await {
                Ok(Some(response)) => {
                    let mut response_str = serde_json::to_string(&response)?;
                    response_str.push('\n');
                    stdout.write_all(response_str.as_bytes()).await?;
                    stdout.flush().await?;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("Error handling message: {}", e);
                }
            }
        }

        tracing::info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Handle an incoming JSON-RPC message. Notifications yield `None`.
    pub async fn handle_message(&self, message: &str) -> Result<Option<JsonRpcResponse>> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                return Ok(Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(e.to_string()),
                )));
            }
        };

        tracing::debug!("MCP request: {}", request.method);

        if request.is_notification() {
            if request.method != methods::INITIALIZED {
                tracing::debug!("Ignoring notification: {}", request.method);
            }
            return Ok(None);
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            methods::INITIALIZE => {
                JsonRpcResponse::success(id, self.handle_initialize()?)
            }
            methods::PING => JsonRpcResponse::success(id, serde_json::json!({})),
            methods::LIST_TOOLS => {
                JsonRpcResponse::success(id, self.handle_list_tools()?)
            }
            methods::CALL_TOOL => match self.handle_call_tool(&request).await {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(error) => JsonRpcResponse::error(id, error),
            },
            _ => JsonRpcResponse::error(id, JsonRpcError::method_not_found(&request.method)),
        };

        Ok(Some(response))
    }

    fn handle_initialize(&self) -> Result<Value> {
        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        Ok(serde_json::to_value(result)?)
    }

    fn handle_list_tools(&self) -> Result<Value> {
        let result = ListToolsResult {
            tools: self.tool_handler.list_tools(),
        };

        Ok(serde_json::to_value(result)?)
    }

    async fn handle_call_tool(
        &self,
        request: &JsonRpcRequest,
    ) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = match request.params.as_ref() {
            Some(p) => serde_json::from_value(p.clone()).map_err(|e| {
                JsonRpcError::invalid_params(format!("Invalid tool parameters: {}", e))
            })?,
            None => return Err(JsonRpcError::invalid_params("Missing tool parameters")),
        };

        let result = self.tool_handler.call_tool(&params.name, params.arguments).await;
        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }
}

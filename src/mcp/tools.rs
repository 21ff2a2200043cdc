//! MCP tool definitions and handlers
//!
//! A single `send_email` tool backed by the same [`EmailService`] as the
//! HTTP endpoint, so both surfaces validate and report identically.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::contract::{EmailRequest, ErrorResponse};
use crate::error::McpError;
use crate::mcp::types::{CallToolResult, Tool};
use crate::service::EmailService;

/// Tool handler
pub struct ToolHandler {
    service: Arc<EmailService>,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(service: Arc<EmailService>) -> Self {
        Self { service }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        vec![tool_def(
            "send_email",
            "Send an email using Gmail API. Requires Gmail OAuth setup \
             (run `gmail-send-server auth` first).",
            send_email_schema(),
        )]
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        match name {
            "send_email" => self.handle_send_email(args).await,
            _ => CallToolResult::error(
                McpError::UnknownTool {
                    name: name.to_string(),
                }
                .to_string(),
            ),
        }
    }

    async fn handle_send_email(&self, args: Value) -> CallToolResult {
        let args = if args.is_null() { json!({}) } else { args };

        let request: EmailRequest = match serde_json::from_value(args) {
            Ok(r) => r,
            Err(e) => return CallToolResult::json(&ErrorResponse::malformed(e), true),
        };

        match self.service.send_email(&request).await {
            Ok(result) => CallToolResult::json(&result, false),
            Err(e) => {
                tracing::error!("MCP tool send_email failed: {}", e);
                CallToolResult::json(&ErrorResponse::from(&e), true)
            }
        }
    }
}

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

fn send_email_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "to_email": {
                "type": "string",
                "description": "Recipient email address"
            },
            "subject": {
                "type": "string",
                "description": "Email subject line"
            },
            "body": {
                "type": "string",
                "description": "Email body content"
            },
            "is_html": {
                "type": "boolean",
                "default": false,
                "description": "Whether the body is HTML formatted"
            }
        },
        "required": ["to_email", "subject", "body"]
    })
}

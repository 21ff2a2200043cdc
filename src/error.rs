//! Error types for the Gmail send server
//!
//! This module defines the error hierarchy for all operations in the server,
//! and the stable category taxonomy that both entry points report to callers.

use serde::Serialize;
use thiserror::Error;

/// Main error type for the Gmail send server
#[derive(Error, Debug)]
pub enum GmailMcpError {
    /// OAuth credential errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Gmail API errors
    #[error("Gmail API error: {0}")]
    Gmail(#[from] GmailApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// A network call exceeded its bound
    #[error("Request timed out: {operation}")]
    Timeout { operation: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// OAuth credential errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Client credentials file not found: {path}")]
    MissingCredentialFile { path: String },

    #[error("Invalid client credentials format: expected 'installed' or 'web' credentials")]
    InvalidKeysFormat,

    #[error("Token file not found: {path}. Run the 'auth' command to authorize this application")]
    MissingToken { path: String },

    #[error("Token file is unreadable: {message}. Run the 'auth' command to regenerate it")]
    CorruptToken { message: String },

    #[error("Failed to refresh access token: {message}. Run the 'auth' command to re-authorize")]
    RefreshFailed { message: String },

    #[error("Token endpoint unavailable: {message}. Try again later")]
    TokenEndpointUnavailable { message: String },

    #[error("OAuth callback error: {message}")]
    CallbackError { message: String },

    #[error("OAuth state mismatch in callback")]
    StateMismatch,

    #[error("No authorization code provided")]
    NoAuthCode,

    #[error("Token exchange failed: {message}")]
    TokenExchangeFailed { message: String },
}

/// Gmail API errors
#[derive(Error, Debug)]
pub enum GmailApiError {
    #[error("Send failed: {message}")]
    SendFailed { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found: {path}")]
    DirNotFound { path: String },

    #[error("Failed to create config directory: {path}")]
    DirCreationFailed { path: String },

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid email address: {email}")]
    InvalidAddress { email: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },
}

/// Stable, externally visible error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    MissingCredentialFile,
    MissingToken,
    RefreshFailed,
    InvalidAddress,
    ValidationError,
    SendFailed,
    Timeout,
    Internal,
}

impl ErrorCategory {
    /// Tag used in error bodies and tool results
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::MissingCredentialFile => "missing_credential_file",
            ErrorCategory::MissingToken => "missing_token",
            ErrorCategory::RefreshFailed => "refresh_failed",
            ErrorCategory::InvalidAddress => "invalid_address",
            ErrorCategory::ValidationError => "validation_error",
            ErrorCategory::SendFailed => "send_failed",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Internal => "internal",
        }
    }

    /// Whether the caller can fix this by correcting its input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorCategory::InvalidAddress | ErrorCategory::ValidationError
        )
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GmailMcpError {
    /// Map this error onto the stable category taxonomy
    pub fn category(&self) -> ErrorCategory {
        match self {
            GmailMcpError::Auth(e) => match e {
                AuthError::MissingCredentialFile { .. } | AuthError::InvalidKeysFormat => {
                    ErrorCategory::MissingCredentialFile
                }
                AuthError::MissingToken { .. } | AuthError::CorruptToken { .. } => {
                    ErrorCategory::MissingToken
                }
                AuthError::RefreshFailed { .. } => ErrorCategory::RefreshFailed,
                AuthError::TokenEndpointUnavailable { .. }
                | AuthError::CallbackError { .. }
                | AuthError::StateMismatch
                | AuthError::NoAuthCode
                | AuthError::TokenExchangeFailed { .. } => ErrorCategory::Internal,
            },
            GmailMcpError::Gmail(GmailApiError::SendFailed { .. }) => ErrorCategory::SendFailed,
            GmailMcpError::Validation(ValidationError::InvalidAddress { .. }) => {
                ErrorCategory::InvalidAddress
            }
            GmailMcpError::Validation(_) => ErrorCategory::ValidationError,
            GmailMcpError::Timeout { .. } => ErrorCategory::Timeout,
            GmailMcpError::Http(e) if e.is_timeout() => ErrorCategory::Timeout,
            GmailMcpError::Config(_)
            | GmailMcpError::Mcp(_)
            | GmailMcpError::Io(_)
            | GmailMcpError::Json(_)
            | GmailMcpError::Http(_) => ErrorCategory::Internal,
        }
    }

    /// Classify a transport failure for the named outbound call
    pub fn from_transport(operation: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GmailMcpError::Timeout {
                operation: operation.to_string(),
            }
        } else {
            GmailMcpError::Http(err.without_url())
        }
    }
}

/// Result type alias for Gmail send operations
pub type Result<T> = std::result::Result<T, GmailMcpError>;

//! Configuration management for the Gmail send server
//!
//! Handles paths, environment variables, and configuration loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, GmailMcpError, Result};

/// Configuration for the Gmail send server
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for storing configuration files
    pub config_dir: PathBuf,

    /// Path to the client secret file (downloaded from Google Cloud Console)
    pub credentials_path: PathBuf,

    /// Path to the stored authorization token (access/refresh tokens)
    pub token_path: PathBuf,

    /// Gmail API base URL
    pub api_base_url: String,

    /// HTTP server bind host
    pub http_host: String,

    /// HTTP server bind port
    pub http_port: u16,

    /// OAuth callback port for the interactive flow (0 picks a free port)
    pub oauth_callback_port: u16,

    /// Bound on every outbound network call
    pub request_timeout: Duration,

    /// Access tokens are treated as expired this long before their expiry
    pub expiry_skew: Duration,

    /// Gmail API scopes
    pub scopes: Vec<String>,
}

impl Config {
    /// Create a new configuration from the environment with default paths
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var("GMAIL_CONFIG_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => Self::default_config_dir()?,
        };
        Self::ensure_dir(&config_dir)?;

        let mut config = Self::for_dir(&config_dir);

        if let Ok(path) = std::env::var("GMAIL_CREDENTIALS_PATH") {
            config.credentials_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("GMAIL_TOKEN_PATH") {
            config.token_path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("GMAIL_API_BASE_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(host) = std::env::var("GMAIL_HTTP_HOST") {
            config.http_host = host;
        }
        if let Some(port) = env_parse("GMAIL_HTTP_PORT")? {
            config.http_port = port;
        }
        if let Some(port) = env_parse("GMAIL_OAUTH_PORT")? {
            config.oauth_callback_port = port;
        }
        if let Some(secs) = env_parse::<u64>("GMAIL_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("GMAIL_EXPIRY_SKEW_SECS")? {
            config.expiry_skew = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Configuration rooted at an explicit directory, ignoring the environment
    pub fn for_dir(config_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            credentials_path: config_dir.join("credentials.json"),
            token_path: config_dir.join("token.json"),
            api_base_url: gmail::API_BASE_URL.to_string(),
            http_host: "127.0.0.1".to_string(),
            http_port: 8000,
            oauth_callback_port: 0,
            request_timeout: Duration::from_secs(30),
            expiry_skew: Duration::from_secs(60),
            scopes: vec![gmail::SEND_SCOPE.to_string()],
        }
    }

    /// Default configuration directory (~/.gmail-send)
    fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            GmailMcpError::Config(ConfigError::DirNotFound {
                path: "~".to_string(),
            })
        })?;
        Ok(home.join(".gmail-send"))
    }

    /// Create the configuration directory if it doesn't exist
    fn ensure_dir(config_dir: &Path) -> Result<()> {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir).map_err(|_| {
                GmailMcpError::Config(ConfigError::DirCreationFailed {
                    path: config_dir.display().to_string(),
                })
            })?;
        }
        Ok(())
    }

    /// Check if the client secret file exists
    pub fn credentials_exist(&self) -> bool {
        self.credentials_path.exists()
    }

    /// Check if the token file exists
    pub fn token_exists(&self) -> bool {
        self.token_path.exists()
    }

    /// Try to find credentials.json in the current directory and copy it to the config dir
    pub fn find_and_copy_credentials(&self) -> Result<bool> {
        let local = std::env::current_dir()?.join("credentials.json");

        if local.exists() && !self.credentials_exist() && local != self.credentials_path {
            std::fs::copy(&local, &self.credentials_path)?;
            tracing::info!(
                "Copied credentials.json from working directory to {}",
                self.credentials_path.display()
            );
            return Ok(true);
        }

        Ok(false)
    }

    /// Socket address string for the HTTP server
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Result<Option<T>> {
    match std::env::var(var) {
        Ok(value) => value.trim().parse().map(Some).map_err(|_| {
            GmailMcpError::Config(ConfigError::InvalidValue {
                var: var.to_string(),
                value,
            })
        }),
        Err(_) => Ok(None),
    }
}

/// Gmail API constants
pub mod gmail {
    /// Base URL for Gmail API
    pub const API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

    /// User ID for the authenticated user
    pub const USER_ID: &str = "me";

    /// Send-only scope
    pub const SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";
}

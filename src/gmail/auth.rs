//! OAuth credential store for the Gmail API
//!
//! Handles the credential lifecycle:
//! - Loading client credentials (client secret file)
//! - Loading and atomically persisting the authorization token
//! - Transparent access-token refresh behind a critical section
//! - Read-only diagnostics for operators

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{AuthError, GmailMcpError, Result};

/// OAuth client credentials
#[derive(Clone, Deserialize)]
pub struct ClientSecret {
    /// Client ID
    pub client_id: String,

    /// Client secret
    pub client_secret: String,

    /// Auth URI
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,

    /// Token URI
    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    /// Redirect URIs
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecret")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Client secret file format (can be "installed" or "web")
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    #[serde(alias = "web")]
    installed: Option<ClientSecret>,
}

impl ClientSecret {
    /// Load client credentials from file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GmailMcpError::Auth(AuthError::MissingCredentialFile {
                path: path.display().to_string(),
            }));
        }

        let content = std::fs::read_to_string(path)?;
        let file: ClientSecretFile =
            serde_json::from_str(&content).map_err(|_| AuthError::InvalidKeysFormat)?;

        file.installed
            .ok_or_else(|| GmailMcpError::Auth(AuthError::InvalidKeysFormat))
    }
}

/// Persisted authorization token
///
/// Also reads the layout written by Google's own client libraries
/// (`token` for the access token, RFC 3339 `expiry`).
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthorizationToken {
    /// Access token
    #[serde(alias = "token")]
    pub access_token: String,

    /// Refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Token type (usually "Bearer")
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Access token expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,

    /// Granted scopes
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for AuthorizationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationToken")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("token_type", &self.token_type)
            .field("expiry", &self.expiry)
            .field("scopes", &self.scopes)
            .finish()
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl AuthorizationToken {
    /// Whether the access token is expired (or within `skew` of expiring) at `now`.
    /// Tokens without an expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>, skew: std::time::Duration) -> bool {
        let Some(expiry) = self.expiry else {
            return false;
        };
        // A skew too large to represent pushes the threshold before any `now`.
        match chrono::Duration::from_std(skew)
            .ok()
            .and_then(|skew| expiry.checked_sub_signed(skew))
        {
            Some(threshold) => threshold <= now,
            None => true,
        }
    }

    /// Whether a refresh exchange is possible
    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .map(|t| !t.is_empty())
            .unwrap_or(false)
    }

    /// Build a token from a token-endpoint response, carrying over fields the
    /// provider omitted from `previous`.
    pub(crate) fn from_response(
        response: TokenResponse,
        previous: Option<&AuthorizationToken>,
        now: DateTime<Utc>,
    ) -> Self {
        let scopes = if response.scope.trim().is_empty() {
            previous.map(|p| p.scopes.clone()).unwrap_or_default()
        } else {
            response.scope.split_whitespace().map(str::to_string).collect()
        };

        Self {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
            token_type: response.token_type,
            // Out-of-range lifetimes are stored without an expiry.
            expiry: response
                .expires_in
                .and_then(chrono::Duration::try_seconds)
                .and_then(|lifetime| now.checked_add_signed(lifetime)),
            scopes,
        }
    }
}

/// Token response from OAuth token endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: Option<i64>,
    #[serde(default)]
    scope: String,
}

/// Error body from OAuth token endpoint
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// 400/401 mean the grant or client was rejected; anything else may be transient.
fn is_grant_rejection(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED
}

/// Describe a failed token-endpoint response without echoing request secrets
pub(crate) fn describe_token_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(err) => match err.error_description {
            Some(desc) => format!("{} ({}): {}", err.error, status, desc),
            None => format!("{} ({})", err.error, status),
        },
        Err(_) => format!("token endpoint returned {}", status),
    }
}

/// Read the token file
pub async fn read_token_file(path: &Path) -> Result<AuthorizationToken> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(GmailMcpError::Auth(AuthError::MissingToken {
                path: path.display().to_string(),
            }));
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|e| {
        GmailMcpError::Auth(AuthError::CorruptToken {
            message: e.to_string(),
        })
    })
}

/// Atomically replace the token file: write a sibling temp file, fsync, rename.
pub async fn write_token_file(path: &Path, token: &AuthorizationToken) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let content = serde_json::to_vec_pretty(token)?;
    let tmp_path = path.with_extension("json.tmp");

    // A stale temp file would keep its old mode; start from a fresh one.
    let _ = tokio::fs::remove_file(&tmp_path).await;

    let written = match write_private_file(&tmp_path, &content).await {
        Ok(()) => tokio::fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }

    tracing::debug!("Token persisted to {}", path.display());
    Ok(())
}

/// Create `path` readable by the owner only and write `content` to it.
async fn write_private_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(content).await?;
    file.sync_all().await
}

/// Narrow credential interface consumed by the mail sender
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Read the persisted token
    async fn load(&self) -> Result<AuthorizationToken>;

    /// Return a token that is currently usable, refreshing and persisting if needed
    async fn ensure_valid(&self) -> Result<AuthorizationToken>;

    /// Force a refresh exchange and persist the result
    async fn refresh(&self) -> Result<AuthorizationToken>;
}

/// Diagnostic view of the credential artifacts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub credentials_file_exists: bool,
    pub token_file_exists: bool,
    pub message: String,
    pub instructions: Vec<String>,
}

#[derive(Default)]
struct TokenState {
    token: Option<AuthorizationToken>,
    /// A refreshed token that has not yet reached disk
    unpersisted: bool,
}

/// Credential store backed by the two local artifacts
pub struct CredentialStore {
    /// Configuration
    config: Config,

    /// HTTP client for the token endpoint
    http_client: reqwest::Client,

    /// In-memory copy of the persisted token
    state: RwLock<TokenState>,

    /// Serializes refresh + persist
    refresh_lock: Mutex<()>,
}

impl CredentialStore {
    /// Create a new credential store
    pub fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            config,
            http_client,
            state: RwLock::new(TokenState::default()),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Configuration this store was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the client secret file
    pub fn client_secret(&self) -> Result<ClientSecret> {
        ClientSecret::load(&self.config.credentials_path)
    }

    fn needs_refresh(&self, token: &AuthorizationToken) -> bool {
        token.is_expired_at(Utc::now(), self.config.expiry_skew)
    }

    /// Persist a token (e.g. from the interactive flow) and make it current
    pub async fn store(&self, token: AuthorizationToken) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;
        write_token_file(&self.config.token_path, &token).await?;

        let mut state = self.state.write().await;
        state.token = Some(token);
        state.unpersisted = false;
        Ok(())
    }

    /// Cached token, falling back to disk. Caller holds `refresh_lock`.
    async fn current_locked(&self) -> Result<AuthorizationToken> {
        {
            let state = self.state.read().await;
            if let Some(ref token) = state.token {
                return Ok(token.clone());
            }
        }
        self.load().await
    }

    /// Retry a persist that failed after an earlier refresh. Caller holds `refresh_lock`.
    async fn flush_unpersisted_locked(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.unpersisted {
            return Ok(());
        }
        if let Some(ref token) = state.token {
            write_token_file(&self.config.token_path, token).await?;
            tracing::info!("Persisted previously refreshed token");
        }
        state.unpersisted = false;
        Ok(())
    }

    /// Refresh exchange followed by persist. Caller holds `refresh_lock`.
    async fn refresh_locked(&self, token: &AuthorizationToken) -> Result<AuthorizationToken> {
        let refresh_token = match token.refresh_token.as_deref() {
            Some(rt) if !rt.is_empty() => rt.to_string(),
            _ => {
                return Err(GmailMcpError::Auth(AuthError::RefreshFailed {
                    message: "No refresh token available".to_string(),
                }));
            }
        };

        let keys = self.client_secret()?;

        tracing::info!("Refreshing expired access token");

        let params = [
            ("client_id", keys.client_id.as_str()),
            ("client_secret", keys.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&keys.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| GmailMcpError::from_transport("token refresh", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let message = describe_token_error(status, &text);

            if !is_grant_rejection(status) {
                tracing::warn!("Token endpoint unavailable: {}", message);
                return Err(GmailMcpError::Auth(AuthError::TokenEndpointUnavailable {
                    message,
                }));
            }

            tracing::warn!("Token refresh rejected: {}", message);

            // Drop the cached copy so a re-authorization on disk is picked up next time.
            *self.state.write().await = TokenState::default();

            return Err(GmailMcpError::Auth(AuthError::RefreshFailed { message }));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| GmailMcpError::from_transport("token refresh", e))?;

        let refreshed = AuthorizationToken::from_response(token_response, Some(token), Utc::now());

        let persisted = write_token_file(&self.config.token_path, &refreshed).await;

        let mut state = self.state.write().await;
        state.token = Some(refreshed.clone());
        state.unpersisted = persisted.is_err();
        drop(state);

        match persisted {
            Ok(()) => {
                tracing::info!("Token refreshed and saved to {}", self.config.token_path.display());
                Ok(refreshed)
            }
            Err(e) => {
                tracing::error!("Refreshed token could not be persisted: {}", e);
                Err(e)
            }
        }
    }

    /// Read-only diagnostic check of both artifacts. Never writes.
    pub async fn status(&self) -> AuthStatus {
        let credentials_file_exists = self.config.credentials_exist();
        let token_file_exists = self.config.token_exists();

        let mut status = AuthStatus {
            authenticated: false,
            credentials_file_exists,
            token_file_exists,
            message: String::new(),
            instructions: Vec::new(),
        };

        if !credentials_file_exists {
            status.message = format!(
                "credentials.json not found at {}",
                self.config.credentials_path.display()
            );
            status.instructions = vec![
                "1. Go to https://console.cloud.google.com/".to_string(),
                "2. Create a project or select an existing one".to_string(),
                "3. Enable Gmail API".to_string(),
                "4. Create OAuth 2.0 Client ID (Desktop app)".to_string(),
                format!(
                    "5. Download credentials.json and place it at {}",
                    self.config.credentials_path.display()
                ),
            ];
            return status;
        }

        if !token_file_exists {
            status.message = "token.json not found. Run the 'auth' command to authenticate.".to_string();
            status.instructions = vec![
                "Run: gmail-send-server auth".to_string(),
                "This will open a browser for Google OAuth authentication".to_string(),
            ];
            return status;
        }

        let token = match read_token_file(&self.config.token_path).await {
            Ok(token) => token,
            Err(e) => {
                status.message = format!("Error loading token.json: {}", e);
                status.instructions = vec![
                    "Token file may be corrupted.".to_string(),
                    "Run: gmail-send-server auth to regenerate it".to_string(),
                ];
                return status;
            }
        };

        if !token.access_token.is_empty() && !self.needs_refresh(&token) {
            status.authenticated = true;
            status.message = "Authentication successful".to_string();
        } else if token.can_refresh() {
            status.message = "Token expired but can be refreshed".to_string();
            status.instructions =
                vec!["Token will be automatically refreshed on next use".to_string()];
        } else {
            status.message = "Invalid or expired token".to_string();
            status.instructions =
                vec!["Run: gmail-send-server auth to re-authenticate".to_string()];
        }

        status
    }
}

#[async_trait]
impl TokenSource for CredentialStore {
    async fn load(&self) -> Result<AuthorizationToken> {
        let token = read_token_file(&self.config.token_path).await?;

        let mut state = self.state.write().await;
        state.token = Some(token.clone());
        state.unpersisted = false;
        Ok(token)
    }

    async fn ensure_valid(&self) -> Result<AuthorizationToken> {
        {
            let state = self.state.read().await;
            if let Some(ref token) = state.token {
                if !state.unpersisted && !self.needs_refresh(token) {
                    return Ok(token.clone());
                }
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        self.flush_unpersisted_locked().await?;
        let token = self.current_locked().await?;
        if !self.needs_refresh(&token) {
            return Ok(token);
        }

        self.refresh_locked(&token).await
    }

    async fn refresh(&self) -> Result<AuthorizationToken> {
        let _guard = self.refresh_lock.lock().await;
        let token = self.current_locked().await?;
        self.refresh_locked(&token).await
    }
}

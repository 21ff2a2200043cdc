//! Shared fixtures: a temp config directory wired to a wiremock server that
//! stands in for both the OAuth token endpoint and the Gmail API.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;
use wiremock::MockServer;

use gmail_send_server::config::Config;
use gmail_send_server::gmail::auth::CredentialStore;
use gmail_send_server::gmail::client::GmailClient;
use gmail_send_server::service::EmailService;

pub const CLIENT_SECRET: &str = "GOCSPX-test-client-secret";
pub const REFRESH_TOKEN: &str = "1//test-refresh-token";

pub struct Fixture {
    pub dir: TempDir,
    pub config: Config,
    pub server: MockServer,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;

        let mut config = Config::for_dir(dir.path());
        config.api_base_url = server.uri();
        config.request_timeout = Duration::from_millis(500);

        Self { dir, config, server }
    }

    pub fn token_uri(&self) -> String {
        format!("{}/token", self.server.uri())
    }

    pub fn write_credentials(&self) {
        let keys = json!({
            "installed": {
                "client_id": "test-client.apps.googleusercontent.com",
                "client_secret": CLIENT_SECRET,
                "token_uri": self.token_uri(),
                "redirect_uris": ["http://localhost"]
            }
        });
        std::fs::write(&self.config.credentials_path, keys.to_string()).unwrap();
    }

    /// Token whose access part expires `expires_in` seconds from now
    pub fn write_token(&self, access_token: &str, expires_in: i64, refresh: bool) {
        let mut token = json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expiry": (Utc::now() + chrono::Duration::seconds(expires_in)).to_rfc3339(),
            "scopes": ["https://www.googleapis.com/auth/gmail.send"]
        });
        if refresh {
            token["refresh_token"] = json!(REFRESH_TOKEN);
        }
        std::fs::write(&self.config.token_path, token.to_string()).unwrap();
    }

    pub fn token_bytes(&self) -> Vec<u8> {
        std::fs::read(&self.config.token_path).unwrap()
    }

    pub fn token_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.token_bytes()).unwrap()
    }

    pub fn store(&self) -> Arc<CredentialStore> {
        Arc::new(CredentialStore::new(self.config.clone()).unwrap())
    }

    pub fn service(&self) -> Arc<EmailService> {
        self.service_with(self.store())
    }

    pub fn service_with(&self, store: Arc<CredentialStore>) -> Arc<EmailService> {
        let client = GmailClient::new(store, &self.config).unwrap();
        Arc::new(EmailService::new(client))
    }
}

/// Successful token-endpoint body
pub fn refreshed_token(access_token: &str) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "expires_in": 3599,
        "token_type": "Bearer",
        "scope": "https://www.googleapis.com/auth/gmail.send"
    })
}

//! Gmail API client
//!
//! Submits validated emails through the authenticated Gmail send call.

use std::sync::Arc;

use crate::config::gmail::USER_ID;
use crate::config::Config;
use crate::contract::{EmailResult, ValidatedEmail};
use crate::error::{GmailApiError, GmailMcpError, Result};
use crate::gmail::auth::TokenSource;
use crate::gmail::message::{build_mime_message, encode_raw_message};
use crate::gmail::types::{ApiErrorResponse, Message, SendMessageRequest};

/// Gmail API client
pub struct GmailClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// Credential source
    tokens: Arc<dyn TokenSource>,

    /// Gmail API base URL
    base_url: String,
}

impl GmailClient {
    /// Create a new Gmail client
    pub fn new(tokens: Arc<dyn TokenSource>, config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            tokens,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL for messages
    fn messages_url(&self) -> String {
        format!("{}/users/{}/messages", self.base_url, USER_ID)
    }

    /// Send an email. The provider is not contacted again on failure.
    pub async fn send(&self, email: &ValidatedEmail) -> Result<EmailResult> {
        let raw_message = build_mime_message(email)?;
        let request = SendMessageRequest {
            raw: encode_raw_message(&raw_message),
        };

        let token = self.tokens.ensure_valid().await?;

        let url = format!("{}/send", self.messages_url());
        tracing::debug!("Submitting message to {}", url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token.access_token)
            .json(&request)
            .send()
            .await
            .map_err(send_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let message = describe_api_error(status, &text);
            tracing::error!("Gmail rejected send to {}: {}", email.to_email(), message);
            return Err(GmailMcpError::Gmail(GmailApiError::SendFailed { message }));
        }

        // The message is already sent at this point; an unreadable body only loses the id.
        let message_id = match response.json::<Message>().await {
            Ok(message) => Some(message.id),
            Err(e) => {
                tracing::warn!("Could not parse Gmail send response: {}", e);
                None
            }
        };

        tracing::info!(
            "Email sent successfully. Message ID: {}",
            message_id.as_deref().unwrap_or("unknown")
        );

        Ok(EmailResult::sent(email, message_id))
    }
}

fn send_transport_error(err: reqwest::Error) -> GmailMcpError {
    if err.is_timeout() {
        GmailMcpError::Timeout {
            operation: "Gmail send".to_string(),
        }
    } else {
        GmailMcpError::Gmail(GmailApiError::SendFailed {
            message: format!("request to Gmail failed: {}", err.without_url()),
        })
    }
}

/// Provider error detail for a failed call
fn describe_api_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(err) if !err.error.message.is_empty() => {
            format!("Gmail API error ({}): {}", status, err.error.message)
        }
        _ if body.trim().is_empty() => format!("Gmail API error ({})", status),
        _ => format!("Gmail API error ({}): {}", status, body.trim()),
    }
}

//! Email service shared by the HTTP and MCP entry points

use crate::contract::{EmailRequest, EmailResult};
use crate::error::Result;
use crate::gmail::client::GmailClient;

/// Validates requests and hands them to the Gmail client
pub struct EmailService {
    client: GmailClient,
}

impl EmailService {
    pub fn new(client: GmailClient) -> Self {
        Self { client }
    }

    /// Validate then send. Validation failures never reach the network.
    pub async fn send_email(&self, request: &EmailRequest) -> Result<EmailResult> {
        let email = match request.validate() {
            Ok(email) => email,
            Err(e) => {
                tracing::info!("Rejected send request: {}", e);
                return Err(e);
            }
        };

        self.client.send(&email).await.map_err(|e| {
            tracing::error!("Email sending failed [{}]: {}", e.category(), e);
            e
        })
    }
}

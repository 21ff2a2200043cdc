//! Request/response contract shared by the HTTP and tool entry points
//!
//! Both transports deserialize into [`EmailRequest`], call
//! [`EmailRequest::validate`] before any network activity, and report
//! [`EmailResult`] or [`ErrorResponse`].

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, GmailMcpError, Result, ValidationError};

/// Inbound send request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailRequest {
    /// Recipient address
    #[serde(default)]
    pub to_email: String,

    /// Subject line
    #[serde(default)]
    pub subject: String,

    /// Body content
    #[serde(default)]
    pub body: String,

    /// Whether the body is HTML (defaults to plain text)
    #[serde(default)]
    pub is_html: Option<bool>,
}

/// A request that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedEmail {
    to_email: String,
    subject: String,
    body: String,
    is_html: bool,
}

impl ValidatedEmail {
    pub fn to_email(&self) -> &str {
        &self.to_email
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_html(&self) -> bool {
        self.is_html
    }
}

/// Basic address shape check: one `@`, non-empty local part, dotted domain
pub fn validate_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);

    !local.is_empty()
        && !domain.is_empty()
        && !email.chars().any(|c| c.is_whitespace() || c.is_control())
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

fn missing(field: &str) -> GmailMcpError {
    GmailMcpError::Validation(ValidationError::MissingField {
        field: field.to_string(),
    })
}

impl EmailRequest {
    /// Check every field; the first failure is reported
    pub fn validate(&self) -> Result<ValidatedEmail> {
        let to_email = self.to_email.trim();
        if to_email.is_empty() {
            return Err(missing("to_email"));
        }
        if !validate_email(to_email) {
            return Err(GmailMcpError::Validation(ValidationError::InvalidAddress {
                email: to_email.to_string(),
            }));
        }

        let subject = self.subject.trim();
        if subject.is_empty() {
            return Err(missing("subject"));
        }
        if subject.contains(['\r', '\n']) {
            return Err(GmailMcpError::Validation(ValidationError::InvalidRequest {
                message: "subject must be a single line".to_string(),
            }));
        }

        let body = self.body.trim();
        if body.is_empty() {
            return Err(missing("body"));
        }

        Ok(ValidatedEmail {
            to_email: to_email.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            is_html: self.is_html.unwrap_or(false),
        })
    }
}

/// Successful send result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailResult {
    pub success: bool,
    pub message: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl EmailResult {
    pub fn sent(email: &ValidatedEmail, message_id: Option<String>) -> Self {
        Self {
            success: true,
            message: format!("Email sent successfully to {}", email.to_email()),
            subject: email.subject().to_string(),
            message_id,
        }
    }
}

/// Error body returned by both entry points
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorCategory,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error,
            message: message.into(),
        }
    }

    /// Error body for a request payload that could not be decoded
    pub fn malformed(detail: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCategory::ValidationError,
            format!("Invalid request body: {}", detail),
        )
    }
}

impl From<&GmailMcpError> for ErrorResponse {
    fn from(err: &GmailMcpError) -> Self {
        Self::new(err.category(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(to: &str, subject: &str, body: &str) -> EmailRequest {
        EmailRequest {
            to_email: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            is_html: None,
        }
    }

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com"));
        assert!(validate_email("user.name@domain.co.uk"));
        assert!(validate_email("user+tag@example.com"));
        assert!(validate_email("a@b.co"));
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(!validate_email("not-an-email"));
        assert!(!validate_email("@domain.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email("user@localhost"));
        assert!(!validate_email("user@.com"));
        assert!(!validate_email("user@domain."));
        assert!(!validate_email("user@@domain.com"));
        assert!(!validate_email("us er@domain.com"));
        assert!(!validate_email("user@domain.com\r\nBcc: x@y.com"));
    }

    #[test]
    fn test_valid_request() {
        let email = request(" a@b.com ", "  Hi ", "Hello\n").validate().unwrap();
        assert_eq!(email.to_email(), "a@b.com");
        assert_eq!(email.subject(), "Hi");
        assert_eq!(email.body(), "Hello");
        assert!(!email.is_html());
    }

    #[test]
    fn test_is_html_flag() {
        let mut req = request("a@b.com", "Hi", "<p>Hello</p>");
        req.is_html = Some(true);
        assert!(req.validate().unwrap().is_html());
    }

    #[test]
    fn test_invalid_address() {
        let err = request("not-an-email", "Hi", "Hello").validate().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidAddress);
    }

    #[test]
    fn test_missing_fields() {
        let err = request("", "Hi", "Hello").validate().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ValidationError);
        assert!(err.to_string().contains("to_email"));

        let err = request("a@b.com", "   ", "Hello").validate().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ValidationError);
        assert!(err.to_string().contains("subject"));

        let err = request("a@b.com", "Hi", " \n\t ").validate().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ValidationError);
        assert!(err.to_string().contains("body"));
    }

    #[test]
    fn test_multiline_subject_rejected() {
        let err = request("a@b.com", "Hi\r\nBcc: x@y.com", "Hello")
            .validate()
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ValidationError);
    }

    #[test]
    fn test_request_defaults() {
        let req: EmailRequest =
            serde_json::from_str(r#"{"to_email":"a@b.com","subject":"Hi","body":"Hello","is_html":null}"#)
                .unwrap();
        assert_eq!(req.is_html, None);
        assert!(!req.validate().unwrap().is_html());

        let req: EmailRequest = serde_json::from_str(r#"{"subject":"Hi"}"#).unwrap();
        assert!(req.to_email.is_empty());
    }

    #[test]
    fn test_result_shape() {
        let email = request("a@b.com", "Hi", "Hello").validate().unwrap();
        let result = EmailResult::sent(&email, None);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "message": "Email sent successfully to a@b.com",
                "subject": "Hi"
            })
        );
    }

    #[test]
    fn test_error_response_shape() {
        let err = request("nope", "Hi", "Hello").validate().unwrap_err();
        let body = ErrorResponse::from(&err);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "invalid_address");
        assert!(json["message"].as_str().unwrap().contains("nope"));
    }
}

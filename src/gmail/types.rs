//! Gmail API type definitions
//!
//! These types mirror the Gmail API requests and responses used by the send call.

use serde::{Deserialize, Serialize};

/// Request to send a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Raw RFC 5322 message (base64url encoded)
    pub raw: String,
}

/// A sent Gmail message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message ID
    pub id: String,

    /// Thread ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    /// Label IDs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,
}

/// Google API error envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Google API error detail
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: u16,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_deserialize() {
        let json = r#"{"id":"123","threadId":"456","labelIds":["SENT"]}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, "123");
        assert_eq!(msg.thread_id, Some("456".to_string()));
        assert_eq!(msg.label_ids, vec!["SENT".to_string()]);
    }

    #[test]
    fn test_send_request_serialize() {
        let request = SendMessageRequest {
            raw: "abc".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"raw":"abc"}"#);
    }

    #[test]
    fn test_api_error_deserialize() {
        let json = r#"{"error":{"code":403,"message":"Insufficient Permission","status":"PERMISSION_DENIED","errors":[]}}"#;
        let err: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(err.error.code, 403);
        assert_eq!(err.error.status.as_deref(), Some("PERMISSION_DENIED"));
    }
}

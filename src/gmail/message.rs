//! MIME message construction for the Gmail send call

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use mail_builder::MessageBuilder;

use crate::contract::ValidatedEmail;
use crate::error::Result;

/// Build an RFC 5322 message with a single `text/plain` or `text/html` part.
///
/// No `From` header is written; Gmail fills in the authenticated sender.
pub fn build_mime_message(email: &ValidatedEmail) -> Result<String> {
    let builder = MessageBuilder::new()
        .to(email.to_email())
        .subject(email.subject());

    let builder = if email.is_html() {
        builder.html_body(email.body())
    } else {
        builder.text_body(email.body())
    };

    Ok(builder.write_to_string()?)
}

/// Encode a raw email message for Gmail API (base64url, no padding)
pub fn encode_raw_message(message: &str) -> String {
    URL_SAFE_NO_PAD.encode(message.as_bytes())
}

//! Gmail API integration module
//!
//! Credential lifecycle, MIME construction and the send call.

pub mod auth;
pub mod authorize;
pub mod client;
pub mod message;
pub mod types;

//! Gmail Send Server Library
//!
//! Sends email through the Gmail API on behalf of one authorized account,
//! exposed both as an HTTP endpoint and as an MCP tool.

pub mod config;
pub mod contract;
pub mod error;
pub mod gmail;
pub mod http;
pub mod mcp;
pub mod service;

pub use config::Config;
pub use error::{GmailMcpError, Result};

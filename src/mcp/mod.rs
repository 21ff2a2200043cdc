//! MCP (Model Context Protocol) module
//!
//! Exposes the `send_email` tool over stdio or the `/mcp` HTTP mount.

pub mod server;
pub mod tools;
pub mod types;

//! MCP Server for Azure DevOps Git data
//!
//! This crate exposes read access to repositories, branches, pull requests,
//! review threads, and commits via the Model Context Protocol, plus a single
//! write operation for posting review comments.
//!
//! # Architecture
//!
//! ```text
//! [ MCP Client (agent / IDE) ]
//!        | (JSON-RPC over stdio)
//!        v
//! [ ado-mcp: server -> ToolRegistry -> handlers ]
//!        | (Rust API)
//!        v
//! [ ado-core: criteria, identity, pager, projector ]
//!        |
//!        +--> [ ConnectionProvider -> Azure DevOps REST ]
//! ```

pub mod error;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod tools;

pub use error::{Error, Result};
pub use handlers::ToolContext;
pub use registry::ToolRegistry;
pub use server::AdoMcpServer;
pub use tools::{ToolContent, ToolDefinition, ToolResult, get_tool_definitions};

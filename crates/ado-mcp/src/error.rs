//! Error types for the MCP server

use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during MCP server operations
#[derive(Debug, Error)]
pub enum Error {
    /// Error from query translation, the backend, or projection
    #[error(transparent)]
    Core(#[from] ado_core::Error),

    /// Error during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown tool requested
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A tool's input schema failed to compile
    #[error("invalid schema for tool {tool}: {message}")]
    Schema { tool: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a core `InvalidParameters`
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::Core(ado_core::Error::invalid_parameters(message))
    }
}

//! Error types for ado-core

/// Result type for ado-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while translating, fetching, or projecting tool calls
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Argument shape, type, or value violation detected before any network call
    #[error("invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// The identity service had no match for the submitted identifier
    #[error("identity not found: {identifier}")]
    IdentityNotFound { identifier: String },

    /// A repository, branch, pull request, or thread was absent after the fetch
    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: &'static str, id: String },

    /// Network, authentication, or server failure reported by the backend
    #[error("backend unavailable: {message}")]
    BackendUnavailable { message: String },

    /// A string enum parameter outside its closed set
    #[error("invalid value '{value}' for {field}; expected one of: {}", allowed.join(", "))]
    InvalidEnumValue {
        field: String,
        value: String,
        allowed: Vec<&'static str>,
    },

    /// Configuration could not be assembled
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::EntityNotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether this error is raised during validation, before any backend call
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            Error::InvalidParameters { .. } | Error::InvalidEnumValue { .. }
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::BackendUnavailable {
            message: err.to_string(),
        }
    }
}

//! CLI error types.

use concord_net::NetworkError;
use concord_node::NodeError;
use concord_types::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error enum wrapping all crate errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CliError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Node lifecycle or protocol error.
    #[error("{0}")]
    Node(#[from] NodeError),

    /// Network error.
    #[error("{0}")]
    Network(#[from] NetworkError),

    /// IO error.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Identity not initialized.
    #[error("Identity not initialized. Run 'concordd init' first.")]
    IdentityNotInitialized,

    /// Key file already present.
    #[error("Key file already exists: {}. Use --force to replace it.", .0.display())]
    IdentityExists(PathBuf),

    /// User-facing error with actionable message.
    #[error("{0}")]
    User(String),
}

impl CliError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a user-facing error.
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors: 1
            Self::User(_) | Self::IdentityNotInitialized | Self::IdentityExists(_) => 1,
            // Config errors: 3
            Self::Config(_) | Self::Toml(_) => 3,
            // Network errors: 5
            Self::Network(_) => 5,
            // Node errors: 8
            Self::Node(_) => 8,
            // IO errors: 9
            Self::Io(_) => 9,
            // JSON/format errors: 10
            Self::Json(_) => 10,
        }
    }

    /// Get the protocol error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Node(e) => e.error_code(),
            Self::Network(e) => e.error_code(),
            Self::Config(_) | Self::Toml(_) => ErrorCode::ConfigError,
            Self::IdentityNotInitialized | Self::IdentityExists(_) => ErrorCode::ConfigError,
            Self::Io(_) | Self::Json(_) | Self::User(_) => ErrorCode::InternalError,
        }
    }
}

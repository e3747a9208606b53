//! Error types for the application layer.

use std::path::PathBuf;

use cartobind_core::{BridgeError, OperationAbandoned};

/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failures reported by the native object model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SdkError {
    /// Network or transport failure. Displays the native message verbatim.
    #[error("{0}")]
    Network(String),

    /// The object was used before it finished loading.
    #[error("The object has not been loaded")]
    NotLoaded,

    /// The native operation was cancelled.
    #[error("The operation was cancelled")]
    Cancelled,

    /// No backend is attached for this operation.
    #[error("No backend available for '{0}'")]
    BackendUnavailable(&'static str),

    /// The service answered with something that could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl SdkError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create an invalid-response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

/// Errors surfaced by view models and the portal session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    /// A load or network operation failed.
    #[error(transparent)]
    Load(SdkError),

    /// The portal loaded but did not yield an authenticated user.
    #[error("The portal did not provide a signed-in user")]
    MissingUserCredential,

    /// A portal URL could not be parsed.
    #[error("Invalid URL.")]
    InvalidPortalUrl,

    /// Revoking stored credentials failed.
    #[error("Failed to revoke credentials: {0}")]
    Revocation(SdkError),

    /// A native operation finished without ever reporting back.
    #[error(transparent)]
    OperationAbandoned(#[from] OperationAbandoned),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The binding bridge failed (runtime start-up, scheduling).
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl From<SdkError> for AppError {
    fn from(err: SdkError) -> Self {
        Self::Load(err)
    }
}

/// Errors loading or saving an [`AppConfig`](crate::config::AppConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or schema error.
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML generation error.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but is not acceptable.
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: &'static str, message: String },
}

impl ConfigError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a value error.
    pub fn invalid_value(key: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            message: message.into(),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

//! Error types for the cartobind core.

use std::fmt;

/// The main error type for core bridge operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// A native operation dropped its completion without ever calling it.
    OperationAbandoned(OperationAbandoned),
    /// UI scheduler error.
    Scheduler(SchedulerError),
    /// The async runtime could not be created.
    AsyncRuntime(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperationAbandoned(err) => write!(f, "{err}"),
            Self::Scheduler(err) => write!(f, "Scheduler error: {err}"),
            Self::AsyncRuntime(msg) => write!(f, "Failed to start async runtime: {msg}"),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::OperationAbandoned(err) => Some(err),
            Self::Scheduler(err) => Some(err),
            _ => None,
        }
    }
}

/// A native completion callback was dropped without being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationAbandoned;

impl fmt::Display for OperationAbandoned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "The operation finished without delivering a result")
    }
}

impl std::error::Error for OperationAbandoned {}

impl From<OperationAbandoned> for BridgeError {
    fn from(err: OperationAbandoned) -> Self {
        Self::OperationAbandoned(err)
    }
}

/// UI scheduler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// The task ID is invalid, already ran, or was cancelled.
    InvalidTaskId,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTaskId => write!(f, "Invalid, expired or cancelled task ID"),
        }
    }
}

impl std::error::Error for SchedulerError {}

impl From<SchedulerError> for BridgeError {
    fn from(err: SchedulerError) -> Self {
        Self::Scheduler(err)
    }
}

/// A specialized Result type for core bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

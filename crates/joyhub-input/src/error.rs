use thiserror::Error;

use crate::types::InstanceId;

/// A device reported by the driver could not be opened.
#[derive(Debug, Clone, Error)]
#[error("failed to open device {index}: {reason}")]
pub struct OpenError {
    pub index: u32,
    pub reason: String,
}

impl OpenError {
    pub fn new(index: u32, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

/// Error type for input manager operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to initialize the backend (SDL2 or subsystems).
    #[error("Backend init failed: {0}")]
    BackendInit(String),
    /// A device could not be opened.
    #[error(transparent)]
    Open(#[from] OpenError),
    /// The referenced device is no longer registered.
    #[error("Unknown instance: {0}")]
    UnknownInstance(InstanceId),
    /// The worker is shutting down and no longer accepts requests.
    #[error("Shutdown in progress")]
    ShutdownInProgress,
    /// A generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Convenient result alias for input manager operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for zephyr-core

use thiserror::Error;

/// Result type alias for zephyr operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the zephyr framework
///
/// Route resolution never fails; an unmatched request is answered by the
/// not-found handler instead of an error.
#[derive(Debug, Error)]
pub enum Error {
    /// Response body could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid header
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Invalid listen address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// IO error (native only)
    #[cfg(feature = "native")]
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Hyper error (native only)
    #[cfg(feature = "native")]
    #[error("HTTP error: {0}")]
    Hyper(String),
}

//! Error types for the hand-servo library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File or pipe I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be opened or driven
    #[error("Serial error: {0}")]
    Serial(#[from] serialport::Error),

    /// A landmark frame could not be decoded
    #[error("Frame decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Filter initialization error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// The external servo sender could not be reached
    #[error("Dispatch error: {0}")]
    DispatchError(String),

    /// A line on the tracker or serve protocol could not be parsed
    #[error("Protocol error: {0}")]
    ProtocolError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

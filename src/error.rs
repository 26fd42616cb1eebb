//! Error types for the Round Table client.

use thiserror::Error;

/// Errors that can occur when using the Round Table client.
///
/// None of these surface from the gameplay pipeline itself — malformed frames
/// are downgraded to log lines and sends without an open connection are
/// dropped silently. These errors appear only at the transport seam
/// (connecting, sending, receiving over a concrete backend).
#[derive(Debug, Error)]
pub enum RoundTableError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed unexpectedly.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a protocol message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for Round Table client operations.
pub type Result<T> = std::result::Result<T, RoundTableError>;

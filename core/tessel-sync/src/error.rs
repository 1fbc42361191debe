//! Error types for the replication layer.

use thiserror::Error;

/// Result type for replication operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while exchanging messages with the authority.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The channel (or the client's dispatcher) is gone.
    #[error("channel closed")]
    ChannelClosed,

    /// A newer request of the same reply kind replaced this one before a
    /// reply arrived.
    #[error("request superseded by a newer request of the same kind")]
    Superseded,

    /// The authority sent a snapshot that does not validate against the
    /// local schema.
    #[error("snapshot rejected by the local schema (first failing entity: {0})")]
    InvalidSnapshot(String),

    /// No reply within the configured request timeout.
    #[error("operation timed out")]
    Timeout,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Protocol error (message of the wrong direction or kind).
    #[error("protocol error: {0}")]
    Protocol(String),
}

//! Error types for the presence module.

use thiserror::Error;

use crate::channel::ConnectionId;

/// Errors that can occur during presence operations.
#[derive(Debug, Error)]
pub enum PresenceError {
    /// The connection is not subscribed (never was, or already removed).
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),
}

/// Result type for presence operations.
pub type Result<T> = std::result::Result<T, PresenceError>;

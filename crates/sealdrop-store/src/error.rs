//! Error types for the store module.

use sealdrop_core::{Identity, TransferId, TransferState};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The identity is already registered.
    #[error("identity already registered: {0}")]
    DuplicateIdentity(Identity),

    /// The public key is unusable (e.g. the all-zero point).
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    /// No user registered under this identity.
    #[error("unknown identity: {0}")]
    UnknownIdentity(Identity),

    /// The transfer's recipient identity is not registered.
    #[error("unknown recipient: {0}")]
    UnknownRecipient(Identity),

    /// No transfer with this id.
    #[error("transfer not found: {0}")]
    TransferNotFound(TransferId),

    /// The requested state change is not permitted from the current state.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: TransferState,
        to: TransferState,
    },

    /// Blob bytes do not match the reference's checksum.
    #[error("checksum mismatch for blob {handle}")]
    ChecksumMismatch { handle: String },

    /// No blob under this handle.
    #[error("blob not found: {0}")]
    BlobNotFound(String),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

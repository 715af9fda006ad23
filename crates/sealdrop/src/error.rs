//! Error types for the coordinator.

use sealdrop_core::{Identity, TransferId};
use sealdrop_store::StoreError;
use thiserror::Error;

/// Errors that can occur during coordinator operations.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Sender and recipient are the same identity.
    #[error("cannot transfer to self: {0}")]
    SelfTransfer(Identity),

    /// The caller is not a party to the transfer.
    #[error("{identity} may not access transfer {transfer}")]
    Forbidden {
        identity: Identity,
        transfer: TransferId,
    },

    /// The recipient identity is not registered.
    #[error("unknown recipient: {0}")]
    UnknownRecipient(Identity),

    /// No transfer with this id.
    #[error("transfer not found: {0}")]
    TransferNotFound(TransferId),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for coordinator operations.
pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Re-surface the store's not-found kinds as coordinator variants so
/// callers can match on stable error kinds at the API boundary.
pub(crate) fn lift(err: StoreError) -> CoordinatorError {
    match err {
        StoreError::UnknownRecipient(identity) => CoordinatorError::UnknownRecipient(identity),
        StoreError::TransferNotFound(id) => CoordinatorError::TransferNotFound(id),
        other => CoordinatorError::Store(other),
    }
}

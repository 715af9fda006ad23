//! Core domain types for sealdrop.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//! identities and registered users, transfer ids and content hashes,
//! blob references, and the transfer record with its monotonic state
//! machine. It holds no I/O and no storage; backends live in
//! `sealdrop-store` and orchestration in `sealdrop`.

pub mod blob;
pub mod error;
pub mod identity;
pub mod transfer;
pub mod types;

pub use blob::BlobRef;
pub use error::{CoreError, Result};
pub use identity::{Identity, User, MAX_IDENTITY_LEN};
pub use transfer::{NewTransfer, Transfer, TransferState};
pub use types::{ContentHash, TransferId};

//! Store traits: the abstract interfaces for user registry, transfer
//! persistence, and blob storage.
//!
//! These traits let the coordinator be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use sealdrop_core::{BlobRef, Identity, NewTransfer, Transfer, TransferId, TransferState, User};
use sealdrop_crypto::X25519PublicKey;

use crate::error::{Result, StoreError};

/// Registry of users and their public encryption keys.
///
/// Write-once: there is no update or delete. Key rotation is unsupported
/// because it would invalidate every wrapped key addressed to the old key.
#[async_trait]
pub trait KeyRegistry: Send + Sync {
    /// Register a user.
    ///
    /// Returns `DuplicateIdentity` if the identity is taken and
    /// `InvalidKey` if the public key is the all-zero point.
    async fn register_user(&self, user: &User) -> Result<()>;

    /// Look up a registered user. `UnknownIdentity` on miss.
    async fn lookup_user(&self, identity: &Identity) -> Result<User>;

    /// Look up just the public key for an identity.
    async fn lookup_public_key(&self, identity: &Identity) -> Result<X25519PublicKey> {
        Ok(self.lookup_user(identity).await?.public_key)
    }

    /// Whether this identity is registered.
    async fn identity_exists(&self, identity: &Identity) -> Result<bool> {
        match self.lookup_user(identity).await {
            Ok(_) => Ok(true),
            Err(StoreError::UnknownIdentity(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Persistence for transfer records.
///
/// # Design Notes
///
/// - **Store-assigned ids**: `create_transfer` picks a random id; records
///   are mutable in state, so ids are not content-addressed.
/// - **Conditional transitions**: `transition` applies only if the
///   current state admits the target per
///   [`TransferState::can_transition_to`]. Concurrent racers get exactly
///   one winner; losers see `InvalidTransition`.
/// - **Snapshot listings**: `list_transfers_for` returns a point-in-time
///   copy, newest first.
#[async_trait]
pub trait TransferStore: Send + Sync {
    /// Persist a new transfer in the Pending state.
    ///
    /// The store assigns a random [`TransferId`] and stamps `created_at`
    /// with `now` (Unix ms). Returns `UnknownRecipient` if the recipient
    /// identity is not registered.
    async fn create_transfer(&self, new: NewTransfer, now: i64) -> Result<Transfer>;

    /// Get a transfer by id. `TransferNotFound` on miss.
    async fn get_transfer(&self, id: &TransferId) -> Result<Transfer>;

    /// All transfers where `identity` is the sender or the recipient,
    /// ordered by `created_at` descending, ties broken by id.
    async fn list_transfers_for(&self, identity: &Identity) -> Result<Vec<Transfer>>;

    /// Conditionally move a transfer to `to`.
    ///
    /// Returns the updated record, or `InvalidTransition` if the current
    /// state does not admit `to`.
    async fn transition(&self, id: &TransferId, to: TransferState) -> Result<Transfer>;

    /// Expire every Pending transfer whose `expires_at` is at or before
    /// `now`. Returns the ids that were expired.
    async fn expire_due(&self, now: i64) -> Result<Vec<TransferId>>;
}

/// Content-addressed-ish blob storage for ciphertext.
///
/// Handles are opaque and random; the [`BlobRef`] checksum guards
/// against corruption between put and get. This is storage integrity
/// only: end-to-end authenticity is the AEAD tag, verified by the
/// recipient when opening the payload.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store ciphertext bytes, returning a reference with a fresh handle.
    async fn put(&self, bytes: &[u8]) -> Result<BlobRef>;

    /// Fetch the bytes for a reference.
    ///
    /// `BlobNotFound` on a dangling handle, `ChecksumMismatch` if the
    /// stored bytes no longer match the reference's checksum.
    async fn get(&self, blob: &BlobRef) -> Result<Vec<u8>>;
}


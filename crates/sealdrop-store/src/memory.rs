//! In-memory implementations of the store traits.
//!
//! Primarily for testing. Same semantics as SQLite but everything lives
//! in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use rand::RngCore;

use sealdrop_core::{
    BlobRef, Identity, NewTransfer, Transfer, TransferId, TransferState, User,
};

use crate::error::{Result, StoreError};
use crate::traits::{BlobStore, KeyRegistry, TransferStore};

/// In-memory registry and transfer store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Registered users by identity.
    users: HashMap<Identity, User>,

    /// Transfer records by id.
    transfers: HashMap<TransferId, Transfer>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                users: HashMap::new(),
                transfers: HashMap::new(),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyRegistry for MemoryStore {
    async fn register_user(&self, user: &User) -> Result<()> {
        if user.public_key.is_zero() {
            return Err(StoreError::InvalidKey("all-zero public key".into()));
        }

        let mut inner = self.inner.write().unwrap();
        if inner.users.contains_key(&user.identity) {
            return Err(StoreError::DuplicateIdentity(user.identity.clone()));
        }
        inner.users.insert(user.identity.clone(), user.clone());
        Ok(())
    }

    async fn lookup_user(&self, identity: &Identity) -> Result<User> {
        let inner = self.inner.read().unwrap();
        inner
            .users
            .get(identity)
            .cloned()
            .ok_or_else(|| StoreError::UnknownIdentity(identity.clone()))
    }
}

#[async_trait]
impl TransferStore for MemoryStore {
    async fn create_transfer(&self, new: NewTransfer, now: i64) -> Result<Transfer> {
        let mut inner = self.inner.write().unwrap();

        if !inner.users.contains_key(&new.recipient) {
            return Err(StoreError::UnknownRecipient(new.recipient));
        }

        let transfer = Transfer {
            id: TransferId::random(),
            sender: new.sender,
            recipient: new.recipient,
            blob: new.blob,
            wrapped_key: new.wrapped_key,
            state: TransferState::Pending,
            created_at: now,
            expires_at: new.expires_at,
        };

        inner.transfers.insert(transfer.id, transfer.clone());
        Ok(transfer)
    }

    async fn get_transfer(&self, id: &TransferId) -> Result<Transfer> {
        let inner = self.inner.read().unwrap();
        inner
            .transfers
            .get(id)
            .cloned()
            .ok_or(StoreError::TransferNotFound(*id))
    }

    async fn list_transfers_for(&self, identity: &Identity) -> Result<Vec<Transfer>> {
        let inner = self.inner.read().unwrap();
        let mut transfers: Vec<Transfer> = inner
            .transfers
            .values()
            .filter(|t| t.is_party(identity))
            .cloned()
            .collect();
        transfers.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.as_ref().cmp(b.id.as_ref()))
        });
        Ok(transfers)
    }

    async fn transition(&self, id: &TransferId, to: TransferState) -> Result<Transfer> {
        // Write lock for the whole read-check-update: racers serialize
        // here and exactly one observes a valid source state.
        let mut inner = self.inner.write().unwrap();

        let transfer = inner
            .transfers
            .get_mut(id)
            .ok_or(StoreError::TransferNotFound(*id))?;

        if !transfer.state.can_transition_to(to) {
            return Err(StoreError::InvalidTransition {
                from: transfer.state,
                to,
            });
        }

        transfer.state = to;
        Ok(transfer.clone())
    }

    async fn expire_due(&self, now: i64) -> Result<Vec<TransferId>> {
        let mut inner = self.inner.write().unwrap();
        let mut expired = Vec::new();
        for transfer in inner.transfers.values_mut() {
            if transfer.is_expiry_due(now) {
                transfer.state = TransferState::Expired;
                expired.push(transfer.id);
            }
        }
        Ok(expired)
    }
}

/// In-memory blob storage.
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create a new empty blob store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Overwrite stored bytes for a handle. Test hook for simulating
    /// corruption.
    #[doc(hidden)]
    pub fn corrupt(&self, handle: &str, bytes: Vec<u8>) {
        self.blobs.write().unwrap().insert(handle.to_string(), bytes);
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: &[u8]) -> Result<BlobRef> {
        let mut handle_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut handle_bytes);
        let handle = hex::encode(handle_bytes);

        let blob = BlobRef::for_ciphertext(handle.clone(), bytes);
        self.blobs.write().unwrap().insert(handle, bytes.to_vec());
        Ok(blob)
    }

    async fn get(&self, blob: &BlobRef) -> Result<Vec<u8>> {
        let blobs = self.blobs.read().unwrap();
        let bytes = blobs
            .get(&blob.handle)
            .ok_or_else(|| StoreError::BlobNotFound(blob.handle.clone()))?;
        if !blob.matches(bytes) {
            return Err(StoreError::ChecksumMismatch {
                handle: blob.handle.clone(),
            });
        }
        Ok(bytes.clone())
    }
}

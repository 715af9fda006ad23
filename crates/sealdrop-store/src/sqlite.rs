//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend for Sealdrop. It uses rusqlite
//! with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use sealdrop_core::{
    BlobRef, ContentHash, Identity, NewTransfer, Transfer, TransferId, TransferState, User,
};
use sealdrop_crypto::{WrappedKey, X25519PublicKey};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{BlobStore, KeyRegistry, TransferStore};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime; the mutex serializes the
/// read-check-update of conditional transitions.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path.as_ref())?;
        migration::migrate(&mut conn)?;
        debug!(path = %path.as_ref().display(), "opened sqlite store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

/// Lock the connection, mapping a poisoned mutex to a database error.
fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", e)),
        ))
    })
}

fn join_err(e: tokio::task::JoinError) -> StoreError {
    StoreError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
        Some(format!("spawn_blocking failed: {}", e)),
    ))
}

fn invalid_column(idx: usize, name: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(idx, name.into(), rusqlite::types::Type::Blob)
}

// Helper to convert a row to Transfer. Column order:
// transfer_id, sender, recipient, blob_handle, blob_len, blob_checksum,
// wrapped_key, state, created_at, expires_at
fn row_to_transfer(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transfer> {
    let id_bytes: Vec<u8> = row.get("transfer_id")?;
    let sender: String = row.get("sender")?;
    let recipient: String = row.get("recipient")?;
    let checksum_bytes: Vec<u8> = row.get("blob_checksum")?;
    let wrapped_cbor: Vec<u8> = row.get("wrapped_key")?;
    let state_raw: u8 = row.get("state")?;

    let id = TransferId::from(
        <[u8; 16]>::try_from(id_bytes).map_err(|_| invalid_column(0, "transfer_id"))?,
    );
    let sender = Identity::new(sender).map_err(|_| invalid_column(1, "sender"))?;
    let recipient = Identity::new(recipient).map_err(|_| invalid_column(2, "recipient"))?;
    let checksum = ContentHash::from(
        <[u8; 32]>::try_from(checksum_bytes).map_err(|_| invalid_column(5, "blob_checksum"))?,
    );
    let wrapped_key: WrappedKey = ciborium::from_reader(&wrapped_cbor[..])
        .map_err(|_| invalid_column(6, "wrapped_key"))?;
    let state = TransferState::from_u8(state_raw).ok_or_else(|| invalid_column(7, "state"))?;

    Ok(Transfer {
        id,
        sender,
        recipient,
        blob: BlobRef {
            handle: row.get("blob_handle")?,
            len: row.get::<_, i64>("blob_len")? as u64,
            checksum,
        },
        wrapped_key,
        state,
        created_at: row.get("created_at")?,
        expires_at: row.get("expires_at")?,
    })
}

// Helper to encode a wrapped key to CBOR for storage.
fn encode_wrapped_key(wrapped: &WrappedKey) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(wrapped, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

const SELECT_TRANSFER: &str = "SELECT transfer_id, sender, recipient, blob_handle, blob_len, \
     blob_checksum, wrapped_key, state, created_at, expires_at FROM transfers";

#[async_trait]
impl KeyRegistry for SqliteStore {
    async fn register_user(&self, user: &User) -> Result<()> {
        if user.public_key.is_zero() {
            return Err(StoreError::InvalidKey("all-zero public key".into()));
        }

        let user = user.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let existing: Option<String> = conn
                .query_row(
                    "SELECT identity FROM users WHERE identity = ?1",
                    params![user.identity.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Err(StoreError::DuplicateIdentity(user.identity.clone()));
            }

            conn.execute(
                "INSERT INTO users (identity, display_name, public_key) VALUES (?1, ?2, ?3)",
                params![
                    user.identity.as_str(),
                    user.display_name,
                    user.public_key.as_bytes().as_slice(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn lookup_user(&self, identity: &Identity) -> Result<User> {
        let identity = identity.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let row: Option<(String, Vec<u8>)> = conn
                .query_row(
                    "SELECT display_name, public_key FROM users WHERE identity = ?1",
                    params![identity.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let (display_name, key_bytes) =
                row.ok_or_else(|| StoreError::UnknownIdentity(identity.clone()))?;
            let key = <[u8; 32]>::try_from(key_bytes)
                .map_err(|_| StoreError::InvalidData("public key is not 32 bytes".into()))?;

            Ok(User::new(identity, display_name, X25519PublicKey(key)))
        })
        .await
        .map_err(join_err)?
    }
}

#[async_trait]
impl TransferStore for SqliteStore {
    async fn create_transfer(&self, new: NewTransfer, now: i64) -> Result<Transfer> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let recipient_exists: Option<String> = conn
                .query_row(
                    "SELECT identity FROM users WHERE identity = ?1",
                    params![new.recipient.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            if recipient_exists.is_none() {
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

            let wrapped_cbor = encode_wrapped_key(&transfer.wrapped_key)?;

            conn.execute(
                "INSERT INTO transfers (
                    transfer_id, sender, recipient, blob_handle, blob_len,
                    blob_checksum, wrapped_key, state, created_at, expires_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    transfer.id.as_ref(),
                    transfer.sender.as_str(),
                    transfer.recipient.as_str(),
                    transfer.blob.handle,
                    transfer.blob.len as i64,
                    transfer.blob.checksum.as_ref(),
                    wrapped_cbor,
                    transfer.state.to_u8(),
                    transfer.created_at,
                    transfer.expires_at,
                ],
            )?;

            Ok(transfer)
        })
        .await
        .map_err(join_err)?
    }

    async fn get_transfer(&self, id: &TransferId) -> Result<Transfer> {
        let id = *id;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            conn.query_row(
                &format!("{} WHERE transfer_id = ?1", SELECT_TRANSFER),
                params![id.as_ref()],
                row_to_transfer,
            )
            .optional()?
            .ok_or(StoreError::TransferNotFound(id))
        })
        .await
        .map_err(join_err)?
    }

    async fn list_transfers_for(&self, identity: &Identity) -> Result<Vec<Transfer>> {
        let identity = identity.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let mut stmt = conn.prepare(&format!(
                "{} WHERE sender = ?1 OR recipient = ?1 \
                 ORDER BY created_at DESC, transfer_id ASC",
                SELECT_TRANSFER
            ))?;
            let transfers = stmt
                .query_map(params![identity.as_str()], row_to_transfer)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(transfers)
        })
        .await
        .map_err(join_err)?
    }

    async fn transition(&self, id: &TransferId, to: TransferState) -> Result<Transfer> {
        let id = *id;
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            // Holding the mutex across read and update serializes
            // concurrent transitions on the same record.
            let conn = lock(&conn)?;

            let state_raw: Option<u8> = conn
                .query_row(
                    "SELECT state FROM transfers WHERE transfer_id = ?1",
                    params![id.as_ref()],
                    |row| row.get(0),
                )
                .optional()?;
            let state_raw = state_raw.ok_or(StoreError::TransferNotFound(id))?;
            let from = TransferState::from_u8(state_raw)
                .ok_or_else(|| StoreError::InvalidData(format!("bad state: {}", state_raw)))?;

            if !from.can_transition_to(to) {
                return Err(StoreError::InvalidTransition { from, to });
            }

            conn.execute(
                "UPDATE transfers SET state = ?1 WHERE transfer_id = ?2 AND state = ?3",
                params![to.to_u8(), id.as_ref(), from.to_u8()],
            )?;

            conn.query_row(
                &format!("{} WHERE transfer_id = ?1", SELECT_TRANSFER),
                params![id.as_ref()],
                row_to_transfer,
            )
            .map_err(StoreError::Database)
        })
        .await
        .map_err(join_err)?
    }

    async fn expire_due(&self, now: i64) -> Result<Vec<TransferId>> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let mut stmt = conn.prepare(
                "SELECT transfer_id FROM transfers \
                 WHERE state = ?1 AND expires_at IS NOT NULL AND expires_at <= ?2",
            )?;
            let ids = stmt
                .query_map(params![TransferState::Pending.to_u8(), now], |row| {
                    row.get::<_, Vec<u8>>(0)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let expired: Vec<TransferId> = ids
                .into_iter()
                .map(|bytes| {
                    <[u8; 16]>::try_from(bytes)
                        .map(TransferId::from)
                        .map_err(|_| StoreError::InvalidData("transfer id is not 16 bytes".into()))
                })
                .collect::<Result<_>>()?;

            conn.execute(
                "UPDATE transfers SET state = ?1 \
                 WHERE state = ?2 AND expires_at IS NOT NULL AND expires_at <= ?3",
                params![
                    TransferState::Expired.to_u8(),
                    TransferState::Pending.to_u8(),
                    now,
                ],
            )?;

            if !expired.is_empty() {
                debug!(count = expired.len(), "expired pending transfers");
            }
            Ok(expired)
        })
        .await
        .map_err(join_err)?
    }
}

#[async_trait]
impl BlobStore for SqliteStore {
    async fn put(&self, bytes: &[u8]) -> Result<BlobRef> {
        let bytes = bytes.to_vec();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let mut handle_bytes = [0u8; 16];
            rand::thread_rng().fill_bytes(&mut handle_bytes);
            let handle = hex::encode(handle_bytes);

            let blob = BlobRef::for_ciphertext(handle.clone(), &bytes);
            conn.execute(
                "INSERT INTO blobs (handle, data) VALUES (?1, ?2)",
                params![handle, bytes],
            )?;
            Ok(blob)
        })
        .await
        .map_err(join_err)?
    }

    async fn get(&self, blob: &BlobRef) -> Result<Vec<u8>> {
        let blob = blob.clone();
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;

            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT data FROM blobs WHERE handle = ?1",
                    params![blob.handle],
                    |row| row.get(0),
                )
                .optional()?;
            let bytes = bytes.ok_or_else(|| StoreError::BlobNotFound(blob.handle.clone()))?;

            if !blob.matches(&bytes) {
                return Err(StoreError::ChecksumMismatch {
                    handle: blob.handle.clone(),
                });
            }
            Ok(bytes)
        })
        .await
        .map_err(join_err)?
    }
}

//! The TransferCoordinator: unified server-side API for Sealdrop.
//!
//! The coordinator brings together the key registry, the transfer store,
//! and the presence channel into one interface. It enforces the policy
//! the stores do not: who may see a transfer, who may move its state,
//! and the persist-before-notify ordering that makes every notification
//! fetchable.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use sealdrop_core::{BlobRef, Identity, NewTransfer, Transfer, TransferId, TransferState, User};
use sealdrop_crypto::{WrappedKey, X25519PublicKey};
use sealdrop_presence::{PresenceChannel, PresenceEvent, PresenceSubscription};
use sealdrop_store::{KeyRegistry, StoreError, TransferStore};

use crate::error::{lift, CoordinatorError, Result};

/// Configuration for the coordinator.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    /// How long a Pending transfer lives before the expiry sweep may
    /// reclaim it. `None` means transfers never expire.
    pub pending_ttl: Option<Duration>,
}

/// The main coordinator struct.
///
/// Generic over the storage backend; in production that is
/// `SqliteStore`, in tests usually `MemoryStore`.
pub struct TransferCoordinator<S> {
    /// The storage backend (registry + transfer records).
    store: Arc<S>,
    /// Presence rooms for transfer notifications.
    presence: Arc<PresenceChannel>,
    /// Configuration.
    config: CoordinatorConfig,
}

impl<S: KeyRegistry + TransferStore> TransferCoordinator<S> {
    /// Create a new coordinator over a storage backend.
    pub fn new(store: S, config: CoordinatorConfig) -> Self {
        Self {
            store: Arc::new(store),
            presence: PresenceChannel::new(),
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the presence channel.
    pub fn presence(&self) -> &Arc<PresenceChannel> {
        &self.presence
    }

    /// Register a user with their public encryption key.
    pub async fn register(
        &self,
        identity: Identity,
        display_name: &str,
        public_key: X25519PublicKey,
    ) -> Result<User> {
        let user = User::new(identity, display_name, public_key);
        self.store.register_user(&user).await?;
        Ok(user)
    }

    /// Look up the public key a sender needs to wrap a content key for
    /// `recipient`.
    pub async fn recipient_key(&self, recipient: &Identity) -> Result<X25519PublicKey> {
        self.store
            .lookup_public_key(recipient)
            .await
            .map_err(|err| match err {
                StoreError::UnknownIdentity(identity) => {
                    CoordinatorError::UnknownRecipient(identity)
                }
                other => lift(other),
            })
    }

    /// Submit a transfer from `sender` to `recipient`.
    ///
    /// The blob is already uploaded and the content key already wrapped
    /// client-side; the coordinator never sees plaintext or unwrapped
    /// keys. The record is persisted before the recipient's room is
    /// notified, so a client reacting to the event can always fetch.
    pub async fn submit(
        &self,
        sender: &Identity,
        recipient: &Identity,
        blob: BlobRef,
        wrapped_key: WrappedKey,
    ) -> Result<Transfer> {
        if sender == recipient {
            return Err(CoordinatorError::SelfTransfer(sender.clone()));
        }

        let now = now_millis();
        let new = NewTransfer {
            sender: sender.clone(),
            recipient: recipient.clone(),
            blob,
            wrapped_key,
            expires_at: self
                .config
                .pending_ttl
                .map(|ttl| now + ttl.as_millis() as i64),
        };

        let transfer = self.store.create_transfer(new, now).await.map_err(lift)?;

        // Persisted; notification is best-effort from here.
        let delivered = self.presence.publish(
            recipient,
            PresenceEvent::NewTransfer {
                transfer_id: transfer.id,
            },
        );
        debug!(id = %transfer.id, %recipient, delivered, "transfer submitted");

        Ok(transfer)
    }

    /// Fetch a transfer record.
    ///
    /// Only the sender or the recipient may fetch. The first recipient
    /// fetch of a Pending record marks it Delivered; later fetches (and
    /// all sender fetches) return the record unchanged.
    pub async fn fetch(&self, identity: &Identity, id: &TransferId) -> Result<Transfer> {
        let transfer = self.store.get_transfer(id).await.map_err(lift)?;
        if !transfer.is_party(identity) {
            return Err(CoordinatorError::Forbidden {
                identity: identity.clone(),
                transfer: *id,
            });
        }

        if identity == &transfer.recipient && transfer.state == TransferState::Pending {
            match self.store.transition(id, TransferState::Delivered).await {
                Ok(delivered) => return Ok(delivered),
                // Lost a delivery race (or the sweep got there first):
                // the record moved under us, return what it is now.
                Err(StoreError::InvalidTransition { from, to }) => {
                    debug!(%id, %from, %to, "delivery transition raced, rereading");
                    return self.store.get_transfer(id).await.map_err(lift);
                }
                Err(other) => return Err(lift(other)),
            }
        }

        Ok(transfer)
    }

    /// Accept a transfer. Forbidden unless the caller is the recipient
    /// and the record is Delivered.
    pub async fn accept(&self, identity: &Identity, id: &TransferId) -> Result<Transfer> {
        let transfer = self.store.get_transfer(id).await.map_err(lift)?;
        if identity != &transfer.recipient || transfer.state != TransferState::Delivered {
            return Err(CoordinatorError::Forbidden {
                identity: identity.clone(),
                transfer: *id,
            });
        }

        match self.store.transition(id, TransferState::Accepted).await {
            Ok(accepted) => {
                debug!(%id, %identity, "transfer accepted");
                Ok(accepted)
            }
            // The record moved between the read and the transition (a
            // concurrent accept, or the sweep): same answer as reading
            // the non-Delivered state up front.
            Err(StoreError::InvalidTransition { .. }) => Err(CoordinatorError::Forbidden {
                identity: identity.clone(),
                transfer: *id,
            }),
            Err(other) => Err(lift(other)),
        }
    }

    /// All transfers `identity` is a party to, newest first.
    pub async fn list(&self, identity: &Identity) -> Result<Vec<Transfer>> {
        self.store.list_transfers_for(identity).await.map_err(lift)
    }

    /// Subscribe `identity` to their presence room.
    ///
    /// The identity comes from the authenticated session, never from the
    /// connection: a client cannot subscribe to someone else's room.
    pub fn subscribe(&self, identity: &Identity) -> PresenceSubscription {
        self.presence.subscribe(identity)
    }

    /// Expire every Pending transfer past its deadline. Returns the
    /// expired ids. Normally driven by [`crate::sweep::spawn_expiry_sweep`].
    pub async fn expire_stale(&self) -> Result<Vec<TransferId>> {
        Ok(self.store.expire_due(now_millis()).await?)
    }
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

//! Identity-keyed presence rooms.
//!
//! Each registered identity maps to a room; a client subscribes and
//! receives the events published to that room while it is connected.
//! Membership is ephemeral - nothing is persisted, and a room with no
//! subscribers simply drops its events.
//!
//! The identity a subscription is bound to comes from the caller (the
//! coordinator, which knows the authenticated session), never from the
//! connection itself. A connection cannot join an arbitrary room.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use rand::RngCore;
use tokio::sync::mpsc;
use tracing::debug;

use sealdrop_core::Identity;

use crate::error::{PresenceError, Result};
use crate::event::PresenceEvent;

/// Per-subscription event buffer. A subscriber this far behind starts
/// losing events; delivery is best-effort.
const EVENT_BUFFER: usize = 64;

/// Identifier for a live subscription. Random, never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId([u8; 16]);

impl ConnectionId {
    /// Generate a fresh random connection id.
    pub fn random() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({}..)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

struct ChannelInner {
    /// Room membership: identity -> connection -> event sender.
    rooms: HashMap<Identity, HashMap<ConnectionId, mpsc::Sender<PresenceEvent>>>,

    /// Reverse index: which room each connection is in.
    memberships: HashMap<ConnectionId, Identity>,
}

/// In-process presence hub.
///
/// Thread-safe via RwLock; publish takes the read lock and only
/// upgrades to write when it finds closed receivers to prune.
pub struct PresenceChannel {
    inner: RwLock<ChannelInner>,
}

impl PresenceChannel {
    /// Create a new presence channel with no rooms.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(ChannelInner {
                rooms: HashMap::new(),
                memberships: HashMap::new(),
            }),
        })
    }

    /// Subscribe to the room for `identity`.
    ///
    /// Returns a subscription whose receiver yields the room's events.
    /// Dropping the subscription leaves the room.
    pub fn subscribe(self: &Arc<Self>, identity: &Identity) -> PresenceSubscription {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let connection_id = ConnectionId::random();

        let mut inner = self.inner.write().unwrap();
        inner
            .rooms
            .entry(identity.clone())
            .or_default()
            .insert(connection_id, tx);
        inner.memberships.insert(connection_id, identity.clone());
        debug!(%connection_id, %identity, "presence subscribe");

        PresenceSubscription {
            connection_id,
            identity: identity.clone(),
            receiver: rx,
            channel: Arc::clone(self),
        }
    }

    /// Move an existing connection to a different identity's room.
    ///
    /// One room per connection: the connection leaves its current room.
    /// Re-joining the room it is already in is a no-op.
    pub fn resubscribe(&self, connection_id: ConnectionId, identity: &Identity) -> Result<()> {
        let mut inner = self.inner.write().unwrap();

        let current = inner
            .memberships
            .get(&connection_id)
            .cloned()
            .ok_or(PresenceError::UnknownConnection(connection_id))?;
        if &current == identity {
            return Ok(());
        }

        let sender = match inner.rooms.get_mut(&current) {
            Some(room) => room.remove(&connection_id),
            None => None,
        };
        let sender = sender.ok_or(PresenceError::UnknownConnection(connection_id))?;
        if inner.rooms.get(&current).is_some_and(|room| room.is_empty()) {
            inner.rooms.remove(&current);
        }

        inner
            .rooms
            .entry(identity.clone())
            .or_default()
            .insert(connection_id, sender);
        inner.memberships.insert(connection_id, identity.clone());
        Ok(())
    }

    /// Publish an event to every live subscriber of `identity`'s room.
    ///
    /// Best-effort: a full buffer drops the event for that subscriber,
    /// a closed receiver is pruned from the room. Returns how many
    /// subscribers the event was delivered to; zero is not an error.
    pub fn publish(&self, identity: &Identity, event: PresenceEvent) -> usize {
        let mut dead = Vec::new();
        let mut delivered = 0;

        {
            let inner = self.inner.read().unwrap();
            let Some(room) = inner.rooms.get(identity) else {
                return 0;
            };
            for (connection_id, sender) in room {
                match sender.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!(%connection_id, "presence buffer full, dropping event");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        dead.push(*connection_id);
                    }
                }
            }
        }

        if !dead.is_empty() {
            let mut inner = self.inner.write().unwrap();
            for connection_id in dead {
                remove_connection(&mut inner, connection_id);
            }
        }

        delivered
    }

    /// Remove a connection from its room.
    ///
    /// Dropping the subscription has the same effect; this is the
    /// explicit form.
    pub fn unsubscribe(&self, connection_id: ConnectionId) {
        let mut inner = self.inner.write().unwrap();
        remove_connection(&mut inner, connection_id);
    }

    /// How many live subscribers a room currently has.
    pub fn room_size(&self, identity: &Identity) -> usize {
        let inner = self.inner.read().unwrap();
        inner.rooms.get(identity).map_or(0, |room| room.len())
    }
}

fn remove_connection(inner: &mut ChannelInner, connection_id: ConnectionId) {
    let Some(identity) = inner.memberships.remove(&connection_id) else {
        return;
    };
    if let Some(room) = inner.rooms.get_mut(&identity) {
        room.remove(&connection_id);
        if room.is_empty() {
            inner.rooms.remove(&identity);
        }
    }
    debug!(%connection_id, %identity, "presence unsubscribe");
}

/// A live subscription to an identity's room.
///
/// Holds the receiving end of the room's event stream. Leaves the room
/// when dropped.
pub struct PresenceSubscription {
    connection_id: ConnectionId,
    identity: Identity,
    receiver: mpsc::Receiver<PresenceEvent>,
    channel: Arc<PresenceChannel>,
}

impl PresenceSubscription {
    /// The subscription's connection id.
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// The identity this subscription was bound to at creation.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Receive the next event. Returns `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<PresenceEvent> {
        self.receiver.recv().await
    }

    /// Receive without waiting, if an event is already buffered.
    pub fn try_recv(&mut self) -> Option<PresenceEvent> {
        self.receiver.try_recv().ok()
    }
}

impl fmt::Debug for PresenceSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceSubscription")
            .field("connection_id", &self.connection_id)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl Drop for PresenceSubscription {
    fn drop(&mut self) {
        self.channel.unsubscribe(self.connection_id);
    }
}

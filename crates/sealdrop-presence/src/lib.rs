//! # Sealdrop Presence
//!
//! In-process presence rooms keyed by identity. The coordinator
//! publishes a typed [`PresenceEvent`] to a recipient's room when a
//! transfer is persisted for them; connected clients receive it over a
//! tokio mpsc channel and react by fetching.
//!
//! Delivery is best-effort and carries no payload data. An offline
//! recipient misses the event but loses nothing: the transfer record is
//! persisted first and discoverable by listing.

pub mod channel;
pub mod error;
pub mod event;

pub use channel::{ConnectionId, PresenceChannel, PresenceSubscription};
pub use error::{PresenceError, Result};
pub use event::PresenceEvent;

//! Typed presence events.
//!
//! Events are a closed enum rather than free-form strings, so a client
//! cannot be sent (or claim to handle) anything the server does not
//! define. They carry identifiers only - never plaintext, key material,
//! or blob contents.

use serde::{Deserialize, Serialize};

use sealdrop_core::TransferId;

/// An event delivered to a presence room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PresenceEvent {
    /// A new transfer addressed to the room's identity was persisted.
    ///
    /// The recipient fetches the full record by id; the event itself
    /// discloses nothing else.
    NewTransfer {
        /// Id of the newly created transfer.
        transfer_id: TransferId,
    },
}

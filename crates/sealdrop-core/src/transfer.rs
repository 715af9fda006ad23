//! Transfer records and the monotonic transfer state machine.

use serde::{Deserialize, Serialize};

use sealdrop_crypto::WrappedKey;

use crate::blob::BlobRef;
use crate::identity::Identity;
use crate::types::TransferId;

/// Lifecycle state of a transfer.
///
/// States only move forward: Pending → Delivered → Accepted, and any
/// non-Expired state may move to Expired. There is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransferState {
    /// Created, recipient has not fetched it yet.
    Pending = 0,
    /// The recipient has fetched the record at least once.
    Delivered = 1,
    /// The recipient has explicitly accepted the transfer.
    Accepted = 2,
    /// Expired by the background sweep before acceptance.
    Expired = 3,
}

impl TransferState {
    /// Whether a transition from `self` to `to` is legal.
    pub fn can_transition_to(self, to: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, to),
            (Pending, Delivered) | (Delivered, Accepted) | (Pending | Delivered | Accepted, Expired)
        )
    }

    /// Whether this state is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferState::Accepted | TransferState::Expired)
    }

    /// Encode as a stable integer (storage representation).
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Decode from the storage representation.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(TransferState::Pending),
            1 => Some(TransferState::Delivered),
            2 => Some(TransferState::Accepted),
            3 => Some(TransferState::Expired),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransferState::Pending => "pending",
            TransferState::Delivered => "delivered",
            TransferState::Accepted => "accepted",
            TransferState::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// A persisted transfer record.
///
/// Created once by the coordinator; only its `state` ever changes, and
/// only through the store's conditional transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Store-assigned identifier.
    pub id: TransferId,

    /// Who sent it.
    pub sender: Identity,

    /// Who it is for. Never equal to `sender`.
    pub recipient: Identity,

    /// Reference to the encrypted blob.
    pub blob: BlobRef,

    /// The content key, wrapped to the recipient. Opaque to the server.
    pub wrapped_key: WrappedKey,

    /// Current lifecycle state.
    pub state: TransferState,

    /// Creation time (Unix ms).
    pub created_at: i64,

    /// When the record becomes eligible for expiry, if ever (Unix ms).
    pub expires_at: Option<i64>,
}

impl Transfer {
    /// Whether `identity` is a party (sender or recipient) to this transfer.
    pub fn is_party(&self, identity: &Identity) -> bool {
        &self.sender == identity || &self.recipient == identity
    }

    /// Whether this record is due for expiry at `now`.
    pub fn is_expiry_due(&self, now: i64) -> bool {
        self.state == TransferState::Pending
            && self.expires_at.is_some_and(|at| at <= now)
    }
}

/// The fields of a transfer before the store assigns id, state, and
/// creation time.
#[derive(Debug, Clone)]
pub struct NewTransfer {
    /// Sender identity (from the authenticated session).
    pub sender: Identity,

    /// Recipient identity.
    pub recipient: Identity,

    /// Reference to the uploaded encrypted blob.
    pub blob: BlobRef,

    /// The wrapped content key.
    pub wrapped_key: WrappedKey,

    /// Optional expiry time (Unix ms).
    pub expires_at: Option<i64>,
}

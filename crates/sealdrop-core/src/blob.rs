//! Blob references.
//!
//! Transfer records keep an opaque handle into the blob store rather than
//! the ciphertext itself, keeping the record small.

use serde::{Deserialize, Serialize};

use crate::types::ContentHash;

/// A reference to an encrypted blob held by the blob store collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    /// Opaque handle assigned by the blob store.
    pub handle: String,

    /// Ciphertext length in bytes.
    pub len: u64,

    /// Blake3 checksum of the ciphertext, verified by the blob store on
    /// read. Storage integrity only; never a substitute for the AEAD tag.
    pub checksum: ContentHash,
}

impl BlobRef {
    /// Build a reference for ciphertext about to be stored.
    pub fn for_ciphertext(handle: impl Into<String>, ciphertext: &[u8]) -> Self {
        Self {
            handle: handle.into(),
            len: ciphertext.len() as u64,
            checksum: ContentHash::hash(ciphertext),
        }
    }

    /// Check stored bytes against the recorded checksum and length.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        bytes.len() as u64 == self.len && ContentHash::hash(bytes) == self.checksum
    }
}

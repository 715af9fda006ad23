//! Top-level seal/open: the hybrid scheme as the sending and receiving
//! clients use it.
//!
//! `seal` is everything a sender does before any network call; `open` is
//! everything a recipient does after fetching the record and the blob.

use crate::cipher::{EncryptionKey, SealedPayload};
use crate::error::Result;
use crate::keys::{X25519PublicKey, X25519StaticSecret};
use crate::wrap::WrappedKey;

/// The output of sealing a file for a recipient.
///
/// `payload` goes to the blob store, `wrapped_key` onto the transfer
/// record. The content key itself is dropped when this function returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedTransfer {
    /// The encrypted file.
    pub payload: SealedPayload,

    /// The content key, encrypted to the recipient.
    pub wrapped_key: WrappedKey,
}

/// Encrypt `plaintext` for the holder of `recipient_public`.
///
/// Generates a fresh content key, encrypts the file under it, and wraps
/// the key to the recipient. The hybrid split keeps large files on the
/// symmetric path while the asymmetric layer only ever carries 32 bytes.
pub fn seal(plaintext: &[u8], recipient_public: &X25519PublicKey) -> Result<SealedTransfer> {
    let content_key = EncryptionKey::generate();
    let payload = SealedPayload::encrypt(plaintext, &content_key)?;
    let wrapped_key = WrappedKey::wrap(&content_key, recipient_public)?;

    Ok(SealedTransfer {
        payload,
        wrapped_key,
    })
}

/// Recover the plaintext from a sealed transfer.
///
/// Fails with `UnwrapFailure` when `recipient_secret` does not match the
/// key the sender wrapped to, and `IntegrityFailure` when the payload has
/// been tampered with.
pub fn open(
    payload: &SealedPayload,
    wrapped_key: &WrappedKey,
    recipient_secret: &X25519StaticSecret,
) -> Result<Vec<u8>> {
    let content_key = wrapped_key.unwrap(recipient_secret)?;
    payload.decrypt(&content_key)
}

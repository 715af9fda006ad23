//! Key wrapping via X25519 key agreement.
//!
//! The per-transfer content key is encrypted to the recipient's public key
//! with an ephemeral ECDH exchange, so only the holder of the matching
//! private key can recover it.

use serde::{Deserialize, Serialize};

use crate::cipher::{EncryptionKey, EncryptionNonce};
use crate::error::{CryptoError, Result};
use crate::keys::{EphemeralKeyPair, X25519PublicKey, X25519StaticSecret};

/// A content key encrypted to a recipient's public key.
///
/// Stored verbatim on the transfer record; opaque to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    /// Ephemeral X25519 public key (sender's side of ECDH).
    pub ephemeral_public: X25519PublicKey,

    /// Nonce used to encrypt the content key.
    pub nonce: EncryptionNonce,

    /// The content key, encrypted with the derived wrap key.
    pub encrypted_key: Vec<u8>,
}

impl WrappedKey {
    /// Wrap a content key for a recipient.
    ///
    /// Generates a fresh ephemeral key pair, derives a wrap key from the
    /// shared secret (bound to the ephemeral public key as context), and
    /// encrypts the content key under it.
    pub fn wrap(content_key: &EncryptionKey, recipient_public: &X25519PublicKey) -> Result<Self> {
        let ephemeral = EphemeralKeyPair::generate();
        let ephemeral_public = ephemeral.public_key();

        let shared = ephemeral.diffie_hellman(recipient_public);
        let wrap_key = shared.derive_wrap_key(ephemeral_public.as_bytes());

        let nonce = EncryptionNonce::generate();
        let encrypted_key = wrap_key.encrypt(content_key.as_bytes(), &nonce)?;

        Ok(Self {
            ephemeral_public,
            nonce,
            encrypted_key,
        })
    }

    /// Unwrap the content key with the recipient's secret key.
    ///
    /// Fails with [`CryptoError::UnwrapFailure`] when the secret does not
    /// match the public key the sender wrapped to.
    pub fn unwrap(&self, recipient_secret: &X25519StaticSecret) -> Result<EncryptionKey> {
        let shared = recipient_secret.diffie_hellman(&self.ephemeral_public);
        let wrap_key = shared.derive_wrap_key(self.ephemeral_public.as_bytes());

        let key_bytes = wrap_key
            .decrypt(&self.encrypted_key, &self.nonce)
            .map_err(|_| CryptoError::UnwrapFailure)?;

        if key_bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                got: key_bytes.len(),
            });
        }

        let mut arr = [0u8; 32];
        arr.copy_from_slice(&key_bytes);
        Ok(EncryptionKey::from_bytes(arr))
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).expect("CBOR serialization failed");
        buf
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| CryptoError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let recipient_secret = X25519StaticSecret::generate();
        let recipient_public = recipient_secret.public_key();

        let content_key = EncryptionKey::generate();
        let wrapped = WrappedKey::wrap(&content_key, &recipient_public).unwrap();

        let unwrapped = wrapped.unwrap(&recipient_secret).unwrap();
        assert_eq!(content_key.as_bytes(), unwrapped.as_bytes());
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let recipient_secret = X25519StaticSecret::generate();
        let recipient_public = recipient_secret.public_key();
        let wrong_secret = X25519StaticSecret::generate();

        let content_key = EncryptionKey::generate();
        let wrapped = WrappedKey::wrap(&content_key, &recipient_public).unwrap();

        assert!(matches!(
            wrapped.unwrap(&wrong_secret),
            Err(CryptoError::UnwrapFailure)
        ));
    }

    #[test]
    fn test_fresh_ephemeral_per_wrap() {
        let recipient_public = X25519StaticSecret::generate().public_key();
        let content_key = EncryptionKey::generate();

        let w1 = WrappedKey::wrap(&content_key, &recipient_public).unwrap();
        let w2 = WrappedKey::wrap(&content_key, &recipient_public).unwrap();

        assert_ne!(w1.ephemeral_public, w2.ephemeral_public);
    }

    #[test]
    fn test_wrapped_key_serialization() {
        let recipient_public = X25519StaticSecret::generate().public_key();
        let content_key = EncryptionKey::generate();
        let wrapped = WrappedKey::wrap(&content_key, &recipient_public).unwrap();

        let bytes = wrapped.to_bytes();
        let recovered = WrappedKey::from_bytes(&bytes).unwrap();

        assert_eq!(wrapped, recovered);
    }
}

//! Error types for the crypto module.
//!
//! These errors are terminal to the local encrypt/decrypt attempt and must
//! never be reported back to the server.

use thiserror::Error;

/// Errors that can occur while sealing or opening a transfer.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The wrapped content key could not be decrypted with the given
    /// private key.
    #[error("wrapped key does not unwrap with this private key")]
    UnwrapFailure,

    /// The payload authentication tag did not verify (tampered ciphertext
    /// or wrong content key).
    #[error("payload integrity check failed")]
    IntegrityFailure,

    /// Encryption failed (should not happen with valid key material).
    #[error("encryption failed")]
    Encrypt,

    /// Key material has the wrong length.
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    /// CBOR decoding of a sealed structure failed.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

//! # Sealdrop Crypto
//!
//! Client-resident hybrid encryption for Sealdrop transfers.
//!
//! This crate contains no I/O and no server-side logic. Everything here
//! runs on the sending or receiving client; the server only ever handles
//! the opaque outputs ([`SealedPayload`] bytes and [`WrappedKey`]).
//!
//! ## Scheme
//!
//! 1. A fresh ChaCha20-Poly1305 content key is generated per transfer.
//! 2. The file is encrypted under the content key ([`SealedPayload`]).
//! 3. The content key is wrapped to the recipient's X25519 public key via
//!    ephemeral ECDH ([`WrappedKey`]).
//!
//! Per-transfer keys mean a compromised content key exposes exactly one
//! transfer.
//!
//! ## Key Types
//!
//! - [`X25519PublicKey`] / [`X25519StaticSecret`] - long-lived user keys
//! - [`EncryptionKey`] - per-transfer symmetric content key
//! - [`SealedTransfer`] - the `{payload, wrapped_key}` pair a sender uploads

pub mod cipher;
pub mod error;
pub mod keys;
pub mod seal;
pub mod wrap;

pub use cipher::{EncryptionKey, EncryptionNonce, SealedPayload};
pub use error::{CryptoError, Result};
pub use keys::{EphemeralKeyPair, SharedKey, X25519PublicKey, X25519StaticSecret};
pub use seal::{open, seal, SealedTransfer};
pub use wrap::WrappedKey;

//! # Sealdrop
//!
//! End-to-end encrypted file transfer between registered users. The
//! server side of Sealdrop routes ciphertext and wrapped keys; it can
//! never read a transfer's contents.
//!
//! ## Overview
//!
//! - **Registry**: users register an identity and an X25519 public key
//! - **Hybrid crypto**: a fresh ChaCha20-Poly1305 content key per
//!   transfer, wrapped to the recipient via ephemeral X25519 ECDH
//! - **Transfers**: persisted records with a monotonic state machine
//!   (Pending, Delivered, Accepted, Expired)
//! - **Presence**: identity-keyed rooms deliver a typed notification
//!   when a transfer arrives, best-effort
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealdrop::{CoordinatorConfig, TransferCoordinator};
//! use sealdrop::core::Identity;
//! use sealdrop::crypto::X25519StaticSecret;
//! use sealdrop::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("sealdrop.db").unwrap();
//!     let coordinator = TransferCoordinator::new(store, CoordinatorConfig::default());
//!
//!     // Each client keeps its secret; the server only sees the public half.
//!     let secret = X25519StaticSecret::generate();
//!     let alice = Identity::new("alice@example.com").unwrap();
//!     coordinator
//!         .register(alice, "Alice", secret.public_key())
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `sealdrop::core` - domain types (Identity, Transfer, TransferId)
//! - `sealdrop::crypto` - client-side hybrid encryption
//! - `sealdrop::store` - storage traits, SQLite and memory backends
//! - `sealdrop::presence` - presence rooms and events

pub mod coordinator;
pub mod error;
pub mod sweep;

// Re-export component crates
pub use sealdrop_core as core;
pub use sealdrop_crypto as crypto;
pub use sealdrop_presence as presence;
pub use sealdrop_store as store;

// Re-export main types for convenience
pub use coordinator::{CoordinatorConfig, TransferCoordinator};
pub use error::{CoordinatorError, Result};
pub use sweep::spawn_expiry_sweep;

// Re-export commonly used component types
pub use sealdrop_core::{BlobRef, Identity, Transfer, TransferId, TransferState, User};
pub use sealdrop_presence::{PresenceEvent, PresenceSubscription};

//! # Sealdrop Store
//!
//! Storage abstraction for Sealdrop. Provides trait-based interfaces for
//! the user registry, transfer records, and ciphertext blobs, with SQLite
//! and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`KeyRegistry`] - write-once user registry with public keys
//! - [`TransferStore`] - transfer records with conditional state transitions
//! - [`BlobStore`] - checksummed ciphertext storage
//! - [`SqliteStore`] - SQLite-based persistent backend (implements all three)
//! - [`MemoryStore`] / [`MemoryBlobStore`] - in-memory backends for tests
//!
//! ## Design Notes
//!
//! - **Conditional transitions**: `transition` only applies a state change
//!   the current state admits; concurrent racers resolve to one winner
//! - **Snapshot listings**: `list_transfers_for` is a point-in-time copy,
//!   newest first
//! - **Store-assigned ids**: transfer ids are random, not content-addressed

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::{MemoryBlobStore, MemoryStore};
pub use sqlite::SqliteStore;
pub use traits::{BlobStore, KeyRegistry, TransferStore};

//! # Sealdrop Testkit
//!
//! Testing utilities for Sealdrop.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: parties with client-side key material, plus
//!   memory-backed server stores
//! - **Generators**: proptest strategies for identities, transfer ids,
//!   payloads, and blob references
//!
//! ## Test Fixtures
//!
//! Quickly set up a multi-user scenario:
//!
//! ```rust
//! use sealdrop_testkit::fixtures::multi_party;
//!
//! let parties = multi_party(2);
//! let sealed = parties[0].seal_for(&parties[1], b"file contents");
//! let opened = parties[1].open(&sealed.payload, &sealed.wrapped_key).unwrap();
//! assert_eq!(opened, b"file contents");
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sealdrop_testkit::generators;
//!
//! proptest! {
//!     #[test]
//!     fn identities_survive_reparsing(identity in generators::identity()) {
//!         prop_assert!(sealdrop_core::Identity::new(identity.as_str()).is_ok());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{multi_party, TestFixture, TestParty};

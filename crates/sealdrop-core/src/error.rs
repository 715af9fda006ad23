//! Error types for the core crate.

use thiserror::Error;

/// Errors from core type construction and validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The identity string is not acceptable.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// A hex-encoded identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

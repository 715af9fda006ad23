//! User identities and registered users.
//!
//! An identity is the unique name a user is addressed by, typically an
//! email address. It doubles as the presence room name.

use serde::{Deserialize, Serialize};
use std::fmt;

use sealdrop_crypto::X25519PublicKey;

use crate::error::{CoreError, Result};

/// Maximum identity length in bytes.
pub const MAX_IDENTITY_LEN: usize = 255;

/// A validated user identity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Validate and construct an identity.
    ///
    /// Rejects empty strings, strings over [`MAX_IDENTITY_LEN`] bytes, and
    /// strings containing whitespace or control characters.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(CoreError::InvalidIdentity("empty".into()));
        }
        if s.len() > MAX_IDENTITY_LEN {
            return Err(CoreError::InvalidIdentity(format!(
                "longer than {} bytes",
                MAX_IDENTITY_LEN
            )));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(CoreError::InvalidIdentity(
                "contains whitespace or control characters".into(),
            ));
        }
        Ok(Self(s))
    }

    /// Get the identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Identity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// A registered user: identity, display name, and public key.
///
/// The public key is immutable once registered; rotation would require
/// re-wrapping every pending transfer key and is unsupported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identity (e.g. email).
    pub identity: Identity,

    /// Human-readable display name.
    pub display_name: String,

    /// X25519 public key other users wrap transfer keys to.
    pub public_key: X25519PublicKey,
}

impl User {
    /// Create a user record.
    pub fn new(identity: Identity, display_name: impl Into<String>, public_key: X25519PublicKey) -> Self {
        Self {
            identity,
            display_name: display_name.into(),
            public_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identities() {
        assert!(Identity::new("alice@example.com").is_ok());
        assert!(Identity::new("bob").is_ok());
        assert!(Identity::new("user+tag@host.tld").is_ok());
    }

    #[test]
    fn test_invalid_identities() {
        assert!(Identity::new("").is_err());
        assert!(Identity::new("has space@example.com").is_err());
        assert!(Identity::new("tab\there").is_err());
        assert!(Identity::new("a".repeat(256)).is_err());
    }

    #[test]
    fn test_identity_max_length_boundary() {
        assert!(Identity::new("a".repeat(255)).is_ok());
    }

    #[test]
    fn test_identity_display() {
        let id = Identity::new("alice@example.com").unwrap();
        assert_eq!(id.to_string(), "alice@example.com");
        assert_eq!(id.as_str(), "alice@example.com");
    }
}

//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: parties with key material
//! and a memory-backed server side.

use sealdrop_core::{Identity, User};
use sealdrop_crypto::{
    open, seal, CryptoError, SealedPayload, SealedTransfer, WrappedKey, X25519PublicKey,
    X25519StaticSecret,
};
use sealdrop_store::{KeyRegistry, MemoryBlobStore, MemoryStore};

/// A test party: a user record plus the client-side secret the server
/// never sees.
pub struct TestParty {
    pub user: User,
    secret: X25519StaticSecret,
}

impl TestParty {
    /// Create a party with a random key.
    pub fn new(identity: &str) -> Self {
        Self::from_secret(identity, X25519StaticSecret::generate())
    }

    /// Create with a deterministic key from seed.
    pub fn with_seed(identity: &str, seed: [u8; 32]) -> Self {
        Self::from_secret(identity, X25519StaticSecret::from_bytes(seed))
    }

    fn from_secret(identity: &str, secret: X25519StaticSecret) -> Self {
        let identity = Identity::new(identity).expect("valid test identity");
        let display_name = identity.as_str().split('@').next().unwrap().to_string();
        Self {
            user: User::new(identity, display_name, secret.public_key()),
            secret,
        }
    }

    /// The party's identity.
    pub fn identity(&self) -> &Identity {
        &self.user.identity
    }

    /// The party's public key.
    pub fn public_key(&self) -> X25519PublicKey {
        self.user.public_key
    }

    /// Seal `plaintext` for another party, as this party's client would.
    pub fn seal_for(&self, recipient: &TestParty, plaintext: &[u8]) -> SealedTransfer {
        seal(plaintext, &recipient.public_key()).expect("seal in fixture")
    }

    /// Open a fetched payload with this party's secret.
    pub fn open(
        &self,
        payload: &SealedPayload,
        wrapped_key: &WrappedKey,
    ) -> Result<Vec<u8>, CryptoError> {
        open(payload, wrapped_key, &self.secret)
    }
}

/// A test fixture with memory-backed server-side stores.
pub struct TestFixture {
    pub store: MemoryStore,
    pub blobs: MemoryBlobStore,
}

impl TestFixture {
    /// Create a new empty fixture.
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            blobs: MemoryBlobStore::new(),
        }
    }

    /// Create and register a party in one step.
    pub async fn register(&self, identity: &str) -> TestParty {
        let party = TestParty::new(identity);
        self.store
            .register_user(&party.user)
            .await
            .expect("register fixture party");
        party
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple parties with deterministic keys for multi-party tests.
pub fn multi_party(count: usize) -> Vec<TestParty> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            // Byte 0 is unusable: X25519 clamping clears its low three
            // bits, which would collapse small indices onto one scalar.
            seed[1] = i as u8;
            seed[31] = 0x5d;
            TestParty::with_seed(&format!("party{}@example.com", i), seed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_between_parties() {
        let parties = multi_party(2);
        let sealed = parties[0].seal_for(&parties[1], b"fixture payload");

        let opened = parties[1]
            .open(&sealed.payload, &sealed.wrapped_key)
            .unwrap();
        assert_eq!(opened, b"fixture payload");

        // The sender cannot open what it sealed for someone else.
        assert!(parties[0]
            .open(&sealed.payload, &sealed.wrapped_key)
            .is_err());
    }

    #[test]
    fn test_multi_party_keys_unique() {
        let parties = multi_party(3);
        let pks: Vec<_> = parties.iter().map(|p| p.public_key()).collect();
        assert_ne!(pks[0], pks[1]);
        assert_ne!(pks[1], pks[2]);
        assert_ne!(pks[0], pks[2]);
    }

    #[tokio::test]
    async fn test_fixture_registers_party() {
        let fixture = TestFixture::new();
        let alice = fixture.register("alice@example.com").await;

        let found = fixture.store.lookup_user(alice.identity()).await.unwrap();
        assert_eq!(found, alice.user);
    }
}

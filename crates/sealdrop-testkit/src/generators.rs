//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sealdrop_core::{BlobRef, Identity, TransferId, TransferState};
use sealdrop_crypto::{EncryptionKey, WrappedKey, X25519PublicKey, X25519StaticSecret};

/// Generate a random static secret.
pub fn static_secret() -> impl Strategy<Value = X25519StaticSecret> {
    any::<[u8; 32]>().prop_map(X25519StaticSecret::from_bytes)
}

/// Generate a random public key (derived from a real secret, so it is a
/// valid curve point).
pub fn public_key() -> impl Strategy<Value = X25519PublicKey> {
    static_secret().prop_map(|s| s.public_key())
}

/// Generate a random TransferId.
pub fn transfer_id() -> impl Strategy<Value = TransferId> {
    any::<[u8; 16]>().prop_map(TransferId::from)
}

/// Generate a valid identity string.
pub fn identity() -> impl Strategy<Value = Identity> {
    "[a-z][a-z0-9.]{0,19}@[a-z]{1,10}\\.(com|org|net)"
        .prop_map(|s| Identity::new(s).expect("generated identity is valid"))
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a TransferState.
pub fn transfer_state() -> impl Strategy<Value = TransferState> {
    prop_oneof![
        Just(TransferState::Pending),
        Just(TransferState::Delivered),
        Just(TransferState::Accepted),
        Just(TransferState::Expired),
    ]
}

/// Generate a BlobRef for arbitrary ciphertext bytes.
pub fn blob_ref() -> impl Strategy<Value = BlobRef> {
    (any::<[u8; 16]>(), payload(256)).prop_map(|(handle, bytes)| {
        BlobRef::for_ciphertext(hex::encode(handle), &bytes)
    })
}

/// Generate a wrapped key for a recipient derived from `seed`.
pub fn wrapped_key_for_seed(seed: [u8; 32]) -> WrappedKey {
    let recipient = X25519StaticSecret::from_bytes(seed);
    WrappedKey::wrap(&EncryptionKey::generate(), &recipient.public_key())
        .expect("wrap in generator")
}

/// Generate a reasonable timestamp (Unix ms).
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=i64::MAX / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_generated_identities_are_valid(identity in identity()) {
            // Construction already validated; the parse must round-trip.
            let reparsed = Identity::new(identity.as_str()).unwrap();
            prop_assert_eq!(reparsed, identity);
        }

        #[test]
        fn test_blob_ref_matches_its_bytes(
            handle in any::<[u8; 16]>(),
            bytes in payload(256),
        ) {
            let blob = BlobRef::for_ciphertext(hex::encode(handle), &bytes);
            prop_assert!(blob.matches(&bytes));
            prop_assert_eq!(blob.len, bytes.len() as u64);
        }

        #[test]
        fn test_transfer_id_hex_roundtrip(id in transfer_id()) {
            prop_assert_eq!(TransferId::from_hex(&id.to_hex()).unwrap(), id);
        }
    }
}

//! End-to-end transfer scenarios against the coordinator.
//!
//! These exercise the full path a real deployment takes: clients seal
//! and open locally, the coordinator routes ciphertext and wrapped keys,
//! and the server-side stores never see plaintext.

use std::sync::Arc;
use std::time::Duration;

use sealdrop::store::{BlobStore, MemoryBlobStore, MemoryStore, SqliteStore, StoreError, TransferStore};
use sealdrop::{
    CoordinatorConfig, CoordinatorError, PresenceEvent, TransferCoordinator, TransferState,
};
use sealdrop_testkit::{multi_party, TestParty};

fn coordinator() -> TransferCoordinator<MemoryStore> {
    TransferCoordinator::new(MemoryStore::new(), CoordinatorConfig::default())
}

async fn register(coordinator: &TransferCoordinator<MemoryStore>, party: &TestParty) {
    coordinator
        .register(
            party.identity().clone(),
            &party.user.display_name,
            party.public_key(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_end_to_end_transfer() {
    let coordinator = coordinator();
    let blobs = MemoryBlobStore::new();
    let parties = multi_party(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    register(&coordinator, alice).await;
    register(&coordinator, bob).await;

    // Sender: look up the recipient key, seal, upload, submit.
    let recipient_key = coordinator.recipient_key(bob.identity()).await.unwrap();
    assert_eq!(recipient_key, bob.public_key());

    let plaintext = b"quarterly-report.pdf contents";
    let sealed = alice.seal_for(bob, plaintext);
    let blob = blobs.put(&sealed.payload.to_bytes()).await.unwrap();

    let transfer = coordinator
        .submit(alice.identity(), bob.identity(), blob, sealed.wrapped_key)
        .await
        .unwrap();
    assert_eq!(transfer.state, TransferState::Pending);

    // Recipient: fetch the record, download the blob, open.
    let fetched = coordinator
        .fetch(bob.identity(), &transfer.id)
        .await
        .unwrap();
    assert_eq!(fetched.state, TransferState::Delivered);

    let ciphertext = blobs.get(&fetched.blob).await.unwrap();
    let payload = sealdrop::crypto::SealedPayload::from_bytes(&ciphertext).unwrap();
    let opened = bob.open(&payload, &fetched.wrapped_key).unwrap();
    assert_eq!(opened, plaintext);

    let accepted = coordinator
        .accept(bob.identity(), &transfer.id)
        .await
        .unwrap();
    assert_eq!(accepted.state, TransferState::Accepted);
}

#[tokio::test]
async fn test_wrong_recipient_cannot_open() {
    let parties = multi_party(3);
    let (alice, bob, carol) = (&parties[0], &parties[1], &parties[2]);

    let sealed = alice.seal_for(bob, b"for bob only");
    assert!(carol.open(&sealed.payload, &sealed.wrapped_key).is_err());
}

#[tokio::test]
async fn test_repeated_fetch_is_idempotent() {
    let coordinator = coordinator();
    let parties = multi_party(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    register(&coordinator, alice).await;
    register(&coordinator, bob).await;

    let sealed = alice.seal_for(bob, b"payload");
    let blob = sealdrop::BlobRef::for_ciphertext("h", b"ct");
    let transfer = coordinator
        .submit(alice.identity(), bob.identity(), blob, sealed.wrapped_key)
        .await
        .unwrap();

    let first = coordinator
        .fetch(bob.identity(), &transfer.id)
        .await
        .unwrap();
    let second = coordinator
        .fetch(bob.identity(), &transfer.id)
        .await
        .unwrap();
    assert_eq!(first.state, TransferState::Delivered);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_offline_recipient_still_receives() {
    let coordinator = coordinator();
    let parties = multi_party(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    register(&coordinator, alice).await;
    register(&coordinator, bob).await;

    // Nobody subscribed: submit succeeds anyway.
    let sealed = alice.seal_for(bob, b"payload");
    let blob = sealdrop::BlobRef::for_ciphertext("h", b"ct");
    let transfer = coordinator
        .submit(alice.identity(), bob.identity(), blob, sealed.wrapped_key)
        .await
        .unwrap();

    // The recipient discovers it later by listing.
    let listed = coordinator.list(bob.identity()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, transfer.id);
    assert_eq!(listed[0].state, TransferState::Pending);
}

#[tokio::test]
async fn test_notification_after_persist() {
    let coordinator = coordinator();
    let parties = multi_party(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    register(&coordinator, alice).await;
    register(&coordinator, bob).await;

    let mut subscription = coordinator.subscribe(bob.identity());

    let sealed = alice.seal_for(bob, b"payload");
    let blob = sealdrop::BlobRef::for_ciphertext("h", b"ct");
    let transfer = coordinator
        .submit(alice.identity(), bob.identity(), blob, sealed.wrapped_key)
        .await
        .unwrap();

    let event = subscription.recv().await.unwrap();
    let PresenceEvent::NewTransfer { transfer_id } = event;
    assert_eq!(transfer_id, transfer.id);

    // A client reacting to the event can always fetch: the record was
    // persisted before the room was notified.
    let fetched = coordinator.fetch(bob.identity(), &transfer_id).await.unwrap();
    assert_eq!(fetched.id, transfer.id);
}

#[tokio::test]
async fn test_sender_is_not_notified() {
    let coordinator = coordinator();
    let parties = multi_party(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    register(&coordinator, alice).await;
    register(&coordinator, bob).await;

    let mut sender_sub = coordinator.subscribe(alice.identity());

    let sealed = alice.seal_for(bob, b"payload");
    let blob = sealdrop::BlobRef::for_ciphertext("h", b"ct");
    coordinator
        .submit(alice.identity(), bob.identity(), blob, sealed.wrapped_key)
        .await
        .unwrap();

    assert!(sender_sub.try_recv().is_none());
}

#[tokio::test]
async fn test_concurrent_recipient_fetches_race_cleanly() {
    let coordinator = Arc::new(coordinator());
    let parties = multi_party(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    register(&coordinator, alice).await;
    register(&coordinator, bob).await;

    let sealed = alice.seal_for(bob, b"payload");
    let blob = sealdrop::BlobRef::for_ciphertext("h", b"ct");
    let transfer = coordinator
        .submit(alice.identity(), bob.identity(), blob, sealed.wrapped_key)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let coordinator = Arc::clone(&coordinator);
        let bob_identity = bob.identity().clone();
        let id = transfer.id;
        handles.push(tokio::spawn(async move {
            coordinator.fetch(&bob_identity, &id).await
        }));
    }

    // Every racer gets the record back; the losers of the delivery
    // transition see it as already Delivered, never as an error.
    for handle in handles {
        let fetched = handle.await.unwrap().unwrap();
        assert_eq!(fetched.id, transfer.id);
        assert_eq!(fetched.state, TransferState::Delivered);
    }
}

#[tokio::test]
async fn test_lifecycle_never_regresses() {
    let coordinator = coordinator();
    let parties = multi_party(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    register(&coordinator, alice).await;
    register(&coordinator, bob).await;

    let sealed = alice.seal_for(bob, b"payload");
    let blob = sealdrop::BlobRef::for_ciphertext("h", b"ct");
    let transfer = coordinator
        .submit(alice.identity(), bob.identity(), blob, sealed.wrapped_key)
        .await
        .unwrap();

    coordinator.fetch(bob.identity(), &transfer.id).await.unwrap();
    coordinator.accept(bob.identity(), &transfer.id).await.unwrap();

    // A second accept finds no Delivered record to move.
    let err = coordinator
        .accept(bob.identity(), &transfer.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoordinatorError::Forbidden { .. }));

    // The store itself refuses the regression too.
    let err = coordinator
        .store()
        .transition(&transfer.id, TransferState::Accepted)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::InvalidTransition {
            from: TransferState::Accepted,
            to: TransferState::Accepted,
        }
    ));

    // Accepted is terminal for fetch purposes too.
    let fetched = coordinator
        .fetch(bob.identity(), &transfer.id)
        .await
        .unwrap();
    assert_eq!(fetched.state, TransferState::Accepted);
}

#[tokio::test]
async fn test_expiry_end_to_end() {
    let coordinator = Arc::new(TransferCoordinator::new(
        MemoryStore::new(),
        CoordinatorConfig {
            pending_ttl: Some(Duration::from_millis(10)),
        },
    ));
    let parties = multi_party(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    register(&coordinator, alice).await;
    register(&coordinator, bob).await;

    let sealed = alice.seal_for(bob, b"payload");
    let blob = sealdrop::BlobRef::for_ciphertext("h", b"ct");
    let transfer = coordinator
        .submit(alice.identity(), bob.identity(), blob, sealed.wrapped_key)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    let expired = coordinator.expire_stale().await.unwrap();
    assert_eq!(expired, vec![transfer.id]);

    // An expired transfer is visible but cannot be delivered or accepted.
    let fetched = coordinator
        .fetch(bob.identity(), &transfer.id)
        .await
        .unwrap();
    assert_eq!(fetched.state, TransferState::Expired);
    assert!(coordinator
        .accept(bob.identity(), &transfer.id)
        .await
        .is_err());
}

#[tokio::test]
async fn test_sqlite_backed_coordinator() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("sealdrop.db")).unwrap();
    let coordinator = TransferCoordinator::new(store, CoordinatorConfig::default());

    let parties = multi_party(2);
    let (alice, bob) = (&parties[0], &parties[1]);
    for party in [alice, bob] {
        coordinator
            .register(
                party.identity().clone(),
                &party.user.display_name,
                party.public_key(),
            )
            .await
            .unwrap();
    }

    let plaintext = b"persisted through sqlite";
    let sealed = alice.seal_for(bob, plaintext);
    let ciphertext = sealed.payload.to_bytes();
    let blob = coordinator.store().put(&ciphertext).await.unwrap();

    let transfer = coordinator
        .submit(alice.identity(), bob.identity(), blob, sealed.wrapped_key)
        .await
        .unwrap();

    let fetched = coordinator
        .fetch(bob.identity(), &transfer.id)
        .await
        .unwrap();
    assert_eq!(fetched.state, TransferState::Delivered);

    let ciphertext = coordinator.store().get(&fetched.blob).await.unwrap();
    let payload = sealdrop::crypto::SealedPayload::from_bytes(&ciphertext).unwrap();
    assert_eq!(bob.open(&payload, &fetched.wrapped_key).unwrap(), plaintext);
}

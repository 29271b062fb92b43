//! End-to-end cart session flows: guest browsing with durable local
//! persistence, login/logout authority transitions, and failure recovery
//! against a scripted server.

use std::sync::Arc;

use opaline_cart::engine::{Authority, CartSyncEngine};
use opaline_cart::error::{CartError, ErrorKind};
use opaline_cart::local::LocalCartStore;
use opaline_cart::remote::GatewayError;
use opaline_cart::storage::{FileBackend, StorageBackend};
use opaline_core::{ProductId, Quantity};

use opaline_integration_tests::{ScriptedServer, product, server_line};

fn file_store(dir: &tempfile::TempDir) -> LocalCartStore {
    let backend: Arc<dyn StorageBackend> = Arc::new(FileBackend::new(dir.path()));
    LocalCartStore::new(backend)
}

#[tokio::test]
async fn test_guest_cart_survives_engine_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let server = ScriptedServer::new(&[]);

    {
        let engine = CartSyncEngine::new(file_store(&dir), server.clone(), Authority::Local)
            .await
            .expect("bootstrap");
        engine
            .add_item(product(7, "Opal ring", 100_000), Quantity::ONE)
            .await
            .expect("add ring");
        engine
            .add_item(
                product(12, "Pearl studs", 45_000),
                Quantity::new(2).expect("valid"),
            )
            .await
            .expect("add studs");
    }

    // A new session over the same storage sees the same cart.
    let engine = CartSyncEngine::new(file_store(&dir), server.clone(), Authority::Local)
        .await
        .expect("second bootstrap");
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.items().len(), 2);
    assert_eq!(snapshot.cart_count(), 3);
    assert_eq!(snapshot.cart_total().minor_units(), 190_000);
    assert!(server.calls().is_empty(), "guest session must stay offline");
}

#[tokio::test]
async fn test_login_logout_cycle_preserves_both_authorities() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ring = product(7, "Opal ring", 100_000);
    let pendant = product(9, "Moonstone pendant", 78_000);
    let server = ScriptedServer::new(&[ring.clone(), pendant.clone()]);
    server.seed_cart(vec![server_line(&pendant, 1)]);

    let engine = CartSyncEngine::new(file_store(&dir), server.clone(), Authority::Local)
        .await
        .expect("bootstrap");

    // Guest fills the local cart.
    engine
        .add_item(ring.clone(), Quantity::ONE)
        .await
        .expect("guest add");

    // Login: the remote cart replaces the view, no merge of the guest line.
    let snapshot = engine
        .set_authority(Authority::Remote)
        .await
        .expect("login");
    assert_eq!(snapshot.items().len(), 1);
    assert!(snapshot.contains(ProductId::new(9)));
    assert!(!snapshot.contains(ProductId::new(7)));

    // Authenticated mutations run against the server with a refresh after
    // every write.
    engine
        .add_item(ring.clone(), Quantity::ONE)
        .await
        .expect("remote add");
    engine
        .update_quantity(ProductId::new(9), 3)
        .await
        .expect("remote update");
    assert_eq!(
        server
            .cart()
            .iter()
            .map(|l| (l.product_id.as_i64(), l.quantity.get()))
            .collect::<Vec<_>>(),
        vec![(9, 3), (7, 1)]
    );

    // Logout: the guest cart is exactly as it was left.
    let snapshot = engine
        .set_authority(Authority::Local)
        .await
        .expect("logout");
    assert_eq!(snapshot.items().len(), 1);
    assert!(snapshot.contains(ProductId::new(7)));
    assert_eq!(snapshot.cart_total().minor_units(), 100_000);
}

#[tokio::test]
async fn test_server_failure_mid_session_rolls_back_and_recovers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let ring = product(7, "Opal ring", 100_000);
    let server = ScriptedServer::new(&[ring.clone()]);
    server.seed_cart(vec![server_line(&ring, 2)]);

    let engine = CartSyncEngine::new(file_store(&dir), server.clone(), Authority::Remote)
        .await
        .expect("bootstrap");

    // A flaky network fails the update; the view must roll back.
    server.fail_next("update", GatewayError::Unavailable);
    let err = engine
        .update_quantity(ProductId::new(7), 5)
        .await
        .expect_err("scripted outage");
    assert!(matches!(err, CartError::NetworkUnavailable));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.items().first().map(|l| l.quantity.get()), Some(2));
    assert_eq!(snapshot.last_error(), Some(ErrorKind::NetworkUnavailable));

    // The outage clears; the retry lands and the error flag resets.
    let snapshot = engine
        .update_quantity(ProductId::new(7), 5)
        .await
        .expect("retry");
    assert_eq!(snapshot.items().first().map(|l| l.quantity.get()), Some(5));
    assert_eq!(snapshot.last_error(), None);
}

#[tokio::test]
async fn test_unauthorized_is_surfaced_for_relogin_policy() {
    let ring = product(7, "Opal ring", 100_000);
    let server = ScriptedServer::new(&[ring.clone()]);
    server.seed_cart(vec![server_line(&ring, 1)]);
    let dir = tempfile::tempdir().expect("tempdir");

    let engine = CartSyncEngine::new(file_store(&dir), server.clone(), Authority::Remote)
        .await
        .expect("bootstrap");

    // An expired credential: the engine reports, the consumer redirects.
    server.fail_next("remove", GatewayError::Unauthorized);
    let err = engine
        .remove_item(ProductId::new(7))
        .await
        .expect_err("credential rejected");
    assert!(matches!(err, CartError::Unauthorized));
    assert_eq!(
        engine.snapshot().last_error(),
        Some(ErrorKind::Unauthorized)
    );
}

#[tokio::test]
async fn test_refresh_after_write_call_pattern() {
    let ring = product(7, "Opal ring", 100_000);
    let server = ScriptedServer::new(&[ring.clone()]);
    let dir = tempfile::tempdir().expect("tempdir");

    let engine = CartSyncEngine::new(file_store(&dir), server.clone(), Authority::Remote)
        .await
        .expect("bootstrap");

    engine
        .add_item(ring.clone(), Quantity::ONE)
        .await
        .expect("add");
    engine
        .update_quantity(ProductId::new(7), 4)
        .await
        .expect("update");
    engine.remove_item(ProductId::new(7)).await.expect("remove");

    // Bootstrap list, then every mutation is write + list.
    assert_eq!(
        server.calls(),
        vec!["list", "add", "list", "update", "list", "remove", "list"]
    );
}

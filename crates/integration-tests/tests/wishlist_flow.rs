//! Wishlist flows over durable file-backed persistence, alongside the cart
//! in the same storage directory.

use std::sync::Arc;

use opaline_cart::engine::{Authority, CartSyncEngine};
use opaline_cart::local::LocalCartStore;
use opaline_cart::storage::{FileBackend, StorageBackend};
use opaline_cart::wishlist::WishlistStore;
use opaline_core::{ProductId, Quantity, WishlistItem};

use opaline_integration_tests::{ScriptedServer, product};

fn wishlist_item(id: i64, name: &str) -> WishlistItem {
    let details = product(id, name, 0);
    WishlistItem {
        product_id: details.product_id,
        display: details.display,
    }
}

#[test]
fn test_wishlist_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend: Arc<dyn StorageBackend> = Arc::new(FileBackend::new(dir.path()));

    {
        let store = WishlistStore::new(Arc::clone(&backend));
        assert!(store.toggle(wishlist_item(3, "Amber brooch")).expect("toggle"));
        assert!(store.toggle(wishlist_item(5, "Jade bangle")).expect("toggle"));
        // Toggling off before shutdown must persist the removal too.
        assert!(!store.toggle(wishlist_item(3, "Amber brooch")).expect("toggle"));
    }

    let reopened = WishlistStore::new(backend);
    assert!(!reopened.contains(ProductId::new(3)));
    assert!(reopened.contains(ProductId::new(5)));
    assert_eq!(reopened.items().len(), 1);
}

#[tokio::test]
async fn test_wishlist_and_cart_share_a_directory_independently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend: Arc<dyn StorageBackend> = Arc::new(FileBackend::new(dir.path()));
    let server = ScriptedServer::new(&[]);

    let engine = CartSyncEngine::new(
        LocalCartStore::new(Arc::clone(&backend)),
        server,
        Authority::Local,
    )
    .await
    .expect("bootstrap");
    let wishlist = WishlistStore::new(Arc::clone(&backend));

    engine
        .add_item(product(7, "Opal ring", 100_000), Quantity::ONE)
        .await
        .expect("add to cart");
    wishlist
        .toggle(wishlist_item(7, "Opal ring"))
        .expect("toggle");

    // Removing from the cart leaves the wishlist membership alone.
    engine
        .remove_item(ProductId::new(7))
        .await
        .expect("remove from cart");
    assert!(!engine.is_in_cart(ProductId::new(7)));
    assert!(wishlist.contains(ProductId::new(7)));

    // And clearing the wishlist leaves the (empty) cart record alone.
    wishlist
        .toggle(wishlist_item(7, "Opal ring"))
        .expect("toggle off");
    assert!(wishlist.items().is_empty());
    assert!(engine.snapshot().items().is_empty());
}

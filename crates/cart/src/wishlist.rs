//! Liked-products wishlist.
//!
//! Structurally parallel to the local cart store but simpler: always local,
//! set semantics, no remote authority and therefore no optimistic/rollback
//! machinery - there is only one source of truth.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument, warn};

use opaline_core::{ProductId, WishlistItem};

use crate::error::CartError;
use crate::storage::StorageBackend;

/// Namespace key for persisted wishlist items.
pub const WISHLIST_NAMESPACE: &str = "opaline.wishlist";

/// Persisted set of liked products.
///
/// Membership is idempotent: adding an already-present product and removing
/// an absent one are both no-ops.
pub struct WishlistStore {
    backend: Arc<dyn StorageBackend>,
    items: Mutex<Vec<WishlistItem>>,
}

impl WishlistStore {
    /// Load the wishlist from the backend, recovering from corrupt or
    /// missing data by starting empty.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        let items = match backend.get(WISHLIST_NAMESPACE) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<WishlistItem>>(&raw) {
                Ok(items) => items,
                Err(err) => {
                    warn!(error = %err, "corrupt persisted wishlist state, resetting to empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to read persisted wishlist, starting empty");
                Vec::new()
            }
        };
        Self {
            backend,
            items: Mutex::new(items),
        }
    }

    /// Toggle a product's membership and persist the result. Returns the new
    /// membership: `true` if the product is now on the wishlist.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::PersistenceFailed`] if the backend write fails;
    /// the in-memory set rolls back so the visible wishlist matches what is
    /// on disk.
    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub fn toggle(&self, item: WishlistItem) -> Result<bool, CartError> {
        let mut items = self.lock_items();
        let position = items.iter().position(|i| i.product_id == item.product_id);

        let (next, now_present) = match position {
            Some(index) => {
                let mut next = items.clone();
                next.remove(index);
                (next, false)
            }
            None => {
                let mut next = items.clone();
                next.push(item);
                (next, true)
            }
        };

        let raw = serde_json::to_string(&next).map_err(crate::storage::StorageError::from)?;
        self.backend.put(WISHLIST_NAMESPACE, &raw)?;

        *items = next;
        debug!(present = now_present, "wishlist toggled");
        Ok(now_present)
    }

    /// Whether the wishlist holds `product_id`.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.lock_items()
            .iter()
            .any(|item| item.product_id == product_id)
    }

    /// A snapshot of the wishlist contents.
    #[must_use]
    pub fn items(&self) -> Vec<WishlistItem> {
        self.lock_items().clone()
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<WishlistItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

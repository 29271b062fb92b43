//! Local cart persistence for guest sessions.
//!
//! The store is the source of truth while the engine's authority is
//! `Local`: `load` runs once at engine construction, `save` after every
//! successful local mutation. Unparseable persisted data is not fatal - it
//! resets to an empty cart and is logged as a corrupt-state warning, since
//! cart content is not safety-critical.

use std::sync::Arc;

use tracing::{debug, warn};

use opaline_core::CartLineItem;

use crate::storage::{StorageBackend, StorageError};

/// Namespace key for persisted cart line items.
pub const CART_NAMESPACE: &str = "opaline.cart";

/// Durable client-side persistence of cart line items.
#[derive(Clone)]
pub struct LocalCartStore {
    backend: Arc<dyn StorageBackend>,
}

impl LocalCartStore {
    /// Create a store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Load the persisted cart, recovering from corrupt or missing data.
    ///
    /// A record that fails to parse is discarded and replaced by an empty
    /// cart; the caller sees the corruption only through the returned flag
    /// (and a logged warning).
    #[must_use]
    pub fn load(&self) -> (Vec<CartLineItem>, bool) {
        let raw = match self.backend.get(CART_NAMESPACE) {
            Ok(Some(raw)) => raw,
            Ok(None) => return (Vec::new(), false),
            Err(err) => {
                warn!(error = %err, "failed to read persisted cart, starting empty");
                return (Vec::new(), false);
            }
        };

        match serde_json::from_str::<Vec<CartLineItem>>(&raw) {
            Ok(items) => {
                debug!(count = items.len(), "loaded persisted cart");
                (items, false)
            }
            Err(err) => {
                warn!(error = %err, "corrupt persisted cart state, resetting to empty");
                (Vec::new(), true)
            }
        }
    }

    /// Persist the given cart as the new local truth.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if serialization or the backend write fails;
    /// the caller is expected to roll back its optimistic state.
    pub fn save(&self, items: &[CartLineItem]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(items)?;
        self.backend.put(CART_NAMESPACE, &raw)?;
        debug!(count = items.len(), "persisted cart");
        Ok(())
    }
}

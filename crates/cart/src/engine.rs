//! The cart synchronization orchestrator.
//!
//! [`CartSyncEngine`] owns the reconciled cart state and exposes a uniform
//! read/write API over whichever authority is active:
//!
//! - `Local` - the cart is exactly the content of [`LocalCartStore`]
//! - `Remote` - the cart is exactly the last successful snapshot returned by
//!   the gateway
//!
//! Mutations follow a fixed sequence: validate, guard the product against a
//! concurrent in-flight operation, broadcast an optimistic view, write to
//! the active authority, then commit the authority's answer or roll back to
//! the pre-operation state. The optimistic view is never stored as truth -
//! it only exists on the snapshot channel for immediate UI feedback.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use opaline_core::{
    CartLineItem, DisplaySnapshot, Price, ProductId, Quantity, QuantityDecision, quantity,
};

use crate::error::{CartError, ErrorKind};
use crate::local::LocalCartStore;
use crate::reconcile;
use crate::remote::{CartGateway, GatewayError, LineChange};

/// Which store is the current source of truth for cart contents.
///
/// `Remote` iff a valid auth credential is present; selected once at session
/// bootstrap and again on login/logout transitions, never re-derived inside
/// an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// Anonymous client-side store.
    Local,
    /// Server-authoritative store.
    Remote,
}

/// Kind of mutation currently in flight for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// `add_item`
    Add,
    /// `update_quantity`
    Update,
    /// `remove_item`
    Remove,
}

/// Catalog data needed to put a product into the cart: the id, the display
/// snapshot denormalized at add-time, and the unit price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetails {
    /// Opaque product identifier.
    pub product_id: ProductId,
    /// Display fields captured from the catalog.
    pub display: DisplaySnapshot,
    /// Unit price in minor currency units.
    pub unit_price: Price,
}

/// An immutable read of the engine's state, safe to hand to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    items: Vec<CartLineItem>,
    authority: Authority,
    last_error: Option<ErrorKind>,
}

impl CartSnapshot {
    /// The cart's line items.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// The authority this snapshot was reconciled against.
    #[must_use]
    pub const fn authority(&self) -> Authority {
        self.authority
    }

    /// The most recent operation failure, cleared by the next success.
    #[must_use]
    pub const fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn cart_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity.get()).sum()
    }

    /// Sum of all line totals, in minor currency units.
    #[must_use]
    pub fn cart_total(&self) -> Price {
        self.items
            .iter()
            .fold(Price::ZERO, |total, line| total.saturating_add(line.line_total()))
    }

    /// Whether the cart holds a line for `product_id`.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|line| line.product_id == product_id)
    }
}

/// Engine-private state. `items` is always the reconciled truth for the
/// active authority; optimistic views only ever travel on the snapshot
/// channel.
struct SyncState {
    items: Vec<CartLineItem>,
    index: HashSet<ProductId>,
    authority: Authority,
    pending: HashMap<ProductId, OperationKind>,
    last_error: Option<ErrorKind>,
}

impl SyncState {
    fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            authority: self.authority,
            last_error: self.last_error,
        }
    }

    fn install(&mut self, items: Vec<CartLineItem>) {
        self.index = items.iter().map(|line| line.product_id).collect();
        self.items = items;
    }

    fn any_pending(&self) -> Option<ProductId> {
        self.pending.keys().next().copied()
    }
}

/// The cart synchronization engine.
///
/// Cheap to clone; all clones share one state. Consumers never receive a
/// live reference to the item collection - reads hand out [`CartSnapshot`]
/// values and [`CartSyncEngine::subscribe`] broadcasts them.
pub struct CartSyncEngine<G> {
    inner: Arc<EngineInner<G>>,
}

impl<G> Clone for CartSyncEngine<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct EngineInner<G> {
    gateway: G,
    local: LocalCartStore,
    state: Mutex<SyncState>,
    snapshots: watch::Sender<CartSnapshot>,
}

impl<G: CartGateway> CartSyncEngine<G> {
    /// Bootstrap an engine from the active authority: one `load()` when
    /// `Local`, one `list()` when `Remote`. This is the only proactive
    /// network read the engine ever performs.
    ///
    /// # Errors
    ///
    /// Returns the mapped gateway error if a `Remote` bootstrap cannot fetch
    /// the cart. A corrupt local record is not an error - the cart resets to
    /// empty and the snapshot carries [`ErrorKind::CorruptPersistedState`].
    #[instrument(skip(local, gateway))]
    pub async fn new(
        local: LocalCartStore,
        gateway: G,
        authority: Authority,
    ) -> Result<Self, CartError> {
        let (items, last_error) = match authority {
            Authority::Local => {
                let (items, corrupt) = local.load();
                (items, corrupt.then_some(ErrorKind::CorruptPersistedState))
            }
            Authority::Remote => {
                let lines = gateway.list().await.map_err(CartError::from)?;
                (reconcile::merge_duplicate_lines(lines), None)
            }
        };

        let mut state = SyncState {
            items: Vec::new(),
            index: HashSet::new(),
            authority,
            pending: HashMap::new(),
            last_error,
        };
        state.install(items);
        info!(?authority, count = state.items.len(), "cart engine bootstrapped");

        let (snapshots, _) = watch::channel(state.snapshot());
        Ok(Self {
            inner: Arc::new(EngineInner {
                gateway,
                local,
                state: Mutex::new(state),
                snapshots,
            }),
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The current reconciled state. Never triggers network access.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.lock_state().snapshot()
    }

    /// Whether the reconciled cart holds a line for `product_id`. O(1).
    #[must_use]
    pub fn is_in_cart(&self, product_id: ProductId) -> bool {
        self.lock_state().index.contains(&product_id)
    }

    /// The currently active authority.
    #[must_use]
    pub fn authority(&self) -> Authority {
        self.lock_state().authority
    }

    /// Subscribe to snapshot broadcasts.
    ///
    /// The channel carries optimistic views while a mutation is in flight
    /// and the reconciled state once it settles, so consumers can render
    /// immediately and correct afterwards.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.snapshots.subscribe()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of a product, accumulating onto an existing line.
    ///
    /// # Errors
    ///
    /// - [`CartError::QuantityOutOfRange`] when the accumulated quantity
    ///   would exceed the per-line maximum (refused, not clamped)
    /// - [`CartError::OperationInProgress`] when another mutation on the
    ///   same product is still in flight
    /// - the mapped authority error on write or refresh failure; the visible
    ///   cart rolls back to its pre-call state
    #[instrument(skip(self, product), fields(product_id = %product.product_id, quantity = %quantity))]
    pub async fn add_item(
        &self,
        product: ProductDetails,
        quantity: Quantity,
    ) -> Result<CartSnapshot, CartError> {
        let product_id = product.product_id;
        let (authority, optimistic) = self.begin(product_id, OperationKind::Add, |items| {
            let current = items
                .iter()
                .find(|line| line.product_id == product_id)
                .map_or(0, |line| line.quantity.get());
            // Bounded by 2 * MAX, cannot overflow.
            let combined = current + quantity.get();
            let Some(accumulated) = Quantity::new(combined) else {
                return Err(CartError::QuantityOutOfRange {
                    requested: i64::from(combined),
                });
            };
            Ok(reconcile::upsert_line(
                items,
                CartLineItem {
                    product_id,
                    display: product.display.clone(),
                    quantity: accumulated,
                    unit_price: product.unit_price,
                },
            ))
        })?;

        match authority {
            Authority::Local => self.settle_local(product_id, optimistic),
            Authority::Remote => {
                let outcome = self
                    .refresh_after_write(self.inner.gateway.add(product_id, quantity))
                    .await;
                self.settle(product_id, outcome.map_err(CartError::from))
            }
        }
    }

    /// Set a line's quantity. A request below one removes the line; a
    /// request above the maximum is refused with the prior quantity intact.
    ///
    /// # Errors
    ///
    /// - [`CartError::QuantityOutOfRange`] for requests above the maximum
    /// - [`CartError::NotFound`] when no line exists for `product_id`
    /// - [`CartError::OperationInProgress`] on a same-product conflict
    /// - the mapped authority error on write or refresh failure
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        requested: i64,
    ) -> Result<CartSnapshot, CartError> {
        let decision = quantity::evaluate(requested).map_err(CartError::from)?;
        self.apply_decision(product_id, decision).await
    }

    /// [`Self::update_quantity`] for raw textual input (e.g., a form field).
    ///
    /// # Errors
    ///
    /// As [`Self::update_quantity`], plus [`CartError::InvalidQuantity`] for
    /// non-numeric input.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity_from_input(
        &self,
        product_id: ProductId,
        input: &str,
    ) -> Result<CartSnapshot, CartError> {
        let decision = quantity::parse(input).map_err(CartError::from)?;
        self.apply_decision(product_id, decision).await
    }

    /// Remove a product's line. Removing an absent product is a no-op: no
    /// error, no I/O.
    ///
    /// # Errors
    ///
    /// - [`CartError::OperationInProgress`] on a same-product conflict
    /// - the mapped authority error on write or refresh failure
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: ProductId) -> Result<CartSnapshot, CartError> {
        {
            let state = self.lock_state();
            if !state.index.contains(&product_id) {
                debug!("remove on absent product, no-op");
                return Ok(state.snapshot());
            }
        }

        let (authority, optimistic) = self.begin(product_id, OperationKind::Remove, |items| {
            Ok(reconcile::remove_line(items, product_id))
        })?;

        match authority {
            Authority::Local => self.settle_local(product_id, optimistic),
            Authority::Remote => {
                let outcome = self
                    .refresh_after_write(self.inner.gateway.remove(product_id))
                    .await;
                self.settle(product_id, outcome.map_err(CartError::from))
            }
        }
    }

    /// Switch the active authority, re-reading the new backing store.
    ///
    /// By design this does **not** merge the abandoned authority's items
    /// into the new one: login starts reading the remote cart fresh, logout
    /// resumes whatever the local store already held.
    ///
    /// # Errors
    ///
    /// - [`CartError::OperationInProgress`] while any mutation is in flight
    ///   (a completing operation must not commit into the wrong authority)
    /// - the mapped gateway error when the `Remote` read fails; the engine
    ///   stays on the previous authority
    #[instrument(skip(self))]
    pub async fn set_authority(&self, authority: Authority) -> Result<CartSnapshot, CartError> {
        {
            let state = self.lock_state();
            if state.authority == authority {
                return Ok(state.snapshot());
            }
            if let Some(product_id) = state.any_pending() {
                return Err(CartError::OperationInProgress { product_id });
            }
        }

        let (items, corrupt) = match authority {
            Authority::Remote => {
                let lines = self.inner.gateway.list().await.map_err(CartError::from)?;
                (reconcile::merge_duplicate_lines(lines), false)
            }
            Authority::Local => self.inner.local.load(),
        };

        let mut state = self.lock_state();
        // A mutation may have started while the remote read was in flight;
        // committing the transition now would hand its result to the wrong
        // authority.
        if let Some(product_id) = state.any_pending() {
            return Err(CartError::OperationInProgress { product_id });
        }
        state.authority = authority;
        state.last_error = corrupt.then_some(ErrorKind::CorruptPersistedState);
        state.install(items);
        let snapshot = state.snapshot();
        drop(state);

        self.inner.snapshots.send_replace(snapshot.clone());
        info!(?authority, "authority switched");
        Ok(snapshot)
    }

    // =========================================================================
    // Mutation Plumbing
    // =========================================================================

    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn apply_decision(
        &self,
        product_id: ProductId,
        decision: QuantityDecision,
    ) -> Result<CartSnapshot, CartError> {
        match decision {
            QuantityDecision::Remove => self.remove_item(product_id).await,
            QuantityDecision::Set(target) => {
                let (authority, optimistic) =
                    self.begin(product_id, OperationKind::Update, |items| {
                        if !items.iter().any(|line| line.product_id == product_id) {
                            return Err(CartError::NotFound);
                        }
                        Ok(reconcile::set_line_quantity(items, product_id, target))
                    })?;

                match authority {
                    Authority::Local => self.settle_local(product_id, optimistic),
                    Authority::Remote => {
                        let changes = [LineChange {
                            product_id,
                            quantity: target,
                        }];
                        let outcome = self
                            .refresh_after_write(self.inner.gateway.update_many(&changes))
                            .await;
                        self.settle(product_id, outcome.map_err(CartError::from))
                    }
                }
            }
        }
    }

    /// Validate, guard, and broadcast the optimistic view in one critical
    /// section. On success the product's pending marker is set and the
    /// optimistic items are both broadcast and returned; on any error
    /// nothing changed.
    fn begin<F>(
        &self,
        product_id: ProductId,
        kind: OperationKind,
        make_optimistic: F,
    ) -> Result<(Authority, Vec<CartLineItem>), CartError>
    where
        F: FnOnce(&[CartLineItem]) -> Result<Vec<CartLineItem>, CartError>,
    {
        let mut state = self.lock_state();
        if state.pending.contains_key(&product_id) {
            debug!(%product_id, "rejecting concurrent operation on pending product");
            return Err(CartError::OperationInProgress { product_id });
        }

        let optimistic = make_optimistic(&state.items)?;
        state.pending.insert(product_id, kind);
        let authority = state.authority;

        // Perceived-latency hiding: consumers see the expected result now;
        // the reconciled items stay untouched until the authority confirms.
        self.inner.snapshots.send_replace(CartSnapshot {
            items: optimistic.clone(),
            authority,
            last_error: state.last_error,
        });

        Ok((authority, optimistic))
    }

    /// Run a gateway write followed by the mandatory `list()` refresh. The
    /// refreshed snapshot, not the optimistic one, is what gets committed -
    /// the server may have normalized fields the client cannot compute.
    async fn refresh_after_write(
        &self,
        write: impl Future<Output = Result<(), GatewayError>> + Send,
    ) -> Result<Vec<CartLineItem>, GatewayError> {
        write.await?;
        let lines = self.inner.gateway.list().await?;
        Ok(reconcile::merge_duplicate_lines(lines))
    }

    /// Persist a local mutation and settle it.
    fn settle_local(
        &self,
        product_id: ProductId,
        optimistic: Vec<CartLineItem>,
    ) -> Result<CartSnapshot, CartError> {
        let outcome = self
            .inner
            .local
            .save(&optimistic)
            .map(|()| optimistic)
            .map_err(CartError::from);
        self.settle(product_id, outcome)
    }

    /// Release the pending marker and either commit the authority-confirmed
    /// items or roll the visible state back to the pre-operation snapshot.
    fn settle(
        &self,
        product_id: ProductId,
        outcome: Result<Vec<CartLineItem>, CartError>,
    ) -> Result<CartSnapshot, CartError> {
        let mut state = self.lock_state();
        state.pending.remove(&product_id);

        match outcome {
            Ok(items) => {
                state.last_error = None;
                state.install(items);
                let snapshot = state.snapshot();
                drop(state);
                self.inner.snapshots.send_replace(snapshot.clone());
                Ok(snapshot)
            }
            Err(err) => {
                warn!(%product_id, error = %err, "mutation failed, rolling back optimistic state");
                state.last_error = Some(err.kind());
                // `items` never left the reconciled state; re-broadcasting it
                // is the rollback.
                let snapshot = state.snapshot();
                drop(state);
                self.inner.snapshots.send_replace(snapshot);
                Err(err)
            }
        }
    }
}

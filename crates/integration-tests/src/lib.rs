//! Shared helpers for cart engine integration tests.
//!
//! Provides a scripted in-memory server standing in for the cart REST API,
//! plus builders for catalog products. Tests drive the real engine against
//! it through the same `CartGateway` port the HTTP implementation uses.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use opaline_cart::engine::ProductDetails;
use opaline_cart::remote::{CartGateway, GatewayError, LineChange};
use opaline_core::{CartLineItem, DisplaySnapshot, Price, ProductId, Quantity};

/// Build a catalog product for tests.
///
/// # Panics
///
/// Panics on a negative price; tests pass literals.
#[must_use]
pub fn product(id: i64, name: &str, price: i64) -> ProductDetails {
    ProductDetails {
        product_id: ProductId::new(id),
        display: DisplaySnapshot {
            name: name.to_string(),
            description: format!("{name}, hand-finished"),
            image_url: format!("https://cdn.opaline.example/{id}.jpg"),
        },
        unit_price: Price::from_minor_units(price).expect("non-negative test price"),
    }
}

/// Build a server-side cart line for seeding.
///
/// # Panics
///
/// Panics on out-of-range inputs; tests pass literals.
#[must_use]
pub fn server_line(details: &ProductDetails, quantity: u32) -> CartLineItem {
    CartLineItem {
        product_id: details.product_id,
        display: details.display.clone(),
        quantity: Quantity::new(quantity).expect("valid test quantity"),
        unit_price: details.unit_price,
    }
}

/// A scripted stand-in for the server-authoritative cart.
///
/// Applies writes with server semantics (add accumulates, update sets,
/// remove deletes), knows its own catalog prices, and can be told to fail
/// the next call of a given kind. Cheap to clone; clones share state, so a
/// test can keep a handle while the engine owns another.
#[derive(Clone)]
pub struct ScriptedServer {
    inner: Arc<ServerInner>,
}

struct ServerInner {
    catalog: Mutex<HashMap<ProductId, CartLineItem>>,
    cart: Mutex<Vec<CartLineItem>>,
    failures: Mutex<VecDeque<(&'static str, GatewayError)>>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedServer {
    /// Create a server with an empty cart and the given catalog.
    #[must_use]
    pub fn new(catalog: &[ProductDetails]) -> Self {
        let catalog = catalog
            .iter()
            .map(|details| (details.product_id, server_line(details, 1)))
            .collect();
        Self {
            inner: Arc::new(ServerInner {
                catalog: Mutex::new(catalog),
                cart: Mutex::new(Vec::new()),
                failures: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Seed the server-side cart directly.
    pub fn seed_cart(&self, lines: Vec<CartLineItem>) {
        *lock(&self.inner.cart) = lines;
    }

    /// The server's current cart contents.
    #[must_use]
    pub fn cart(&self) -> Vec<CartLineItem> {
        lock(&self.inner.cart).clone()
    }

    /// Fail the next gateway call named `op` (`"list"`, `"add"`,
    /// `"update"`, or `"remove"`) with `err`.
    pub fn fail_next(&self, op: &'static str, err: GatewayError) {
        lock(&self.inner.failures).push_back((op, err));
    }

    /// The gateway calls observed so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.inner.calls).clone()
    }

    fn enter(&self, op: &'static str) -> Result<(), GatewayError> {
        lock(&self.inner.calls).push(op);
        let mut failures = lock(&self.inner.failures);
        if failures.front().is_some_and(|(name, _)| *name == op) {
            let (_, err) = failures.pop_front().expect("front checked above");
            return Err(err);
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl CartGateway for ScriptedServer {
    async fn list(&self) -> Result<Vec<CartLineItem>, GatewayError> {
        self.enter("list")?;
        Ok(self.cart())
    }

    async fn add(&self, product_id: ProductId, quantity: Quantity) -> Result<(), GatewayError> {
        self.enter("add")?;
        let template = lock(&self.inner.catalog)
            .get(&product_id)
            .cloned()
            .ok_or(GatewayError::NotFound)?;
        let mut cart = lock(&self.inner.cart);
        if let Some(existing) = cart.iter_mut().find(|l| l.product_id == product_id) {
            let combined = (existing.quantity.get() + quantity.get()).min(Quantity::MAX.get());
            existing.quantity = Quantity::new(combined).expect("capped in bounds");
        } else {
            let mut added = template;
            added.quantity = quantity;
            cart.push(added);
        }
        Ok(())
    }

    async fn update_many(&self, changes: &[LineChange]) -> Result<(), GatewayError> {
        self.enter("update")?;
        let mut cart = lock(&self.inner.cart);
        for change in changes {
            let existing = cart
                .iter_mut()
                .find(|l| l.product_id == change.product_id)
                .ok_or(GatewayError::NotFound)?;
            existing.quantity = change.quantity;
        }
        Ok(())
    }

    async fn remove(&self, product_id: ProductId) -> Result<(), GatewayError> {
        self.enter("remove")?;
        lock(&self.inner.cart).retain(|l| l.product_id != product_id);
        Ok(())
    }
}

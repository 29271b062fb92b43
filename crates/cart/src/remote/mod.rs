//! The port to the server-authoritative cart.
//!
//! # Architecture
//!
//! - [`CartGateway`] is the seam the engine talks through; tests script it,
//!   production uses [`HttpCartGateway`] over the cart REST API
//! - Write endpoints do not return the updated cart, so the engine follows
//!   every mutating call with a mandatory `list()` refresh before reporting
//!   success (refresh-after-write: one extra round trip buys an exact match
//!   with server state, including server-normalized prices)

mod http;

pub use http::HttpCartGateway;

use async_trait::async_trait;
use thiserror::Error;

use opaline_core::{CartLineItem, ProductId, Quantity};

/// Errors returned by gateway operations.
///
/// Timeouts are deliberately indistinguishable from transport failures: a
/// call that never resolves must behave exactly like an unreachable network.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GatewayError {
    /// The bearer credential is missing or was rejected (HTTP 401).
    #[error("gateway rejected credential")]
    Unauthorized,

    /// The product or cart does not exist server-side (HTTP 404).
    #[error("gateway resource not found")]
    NotFound,

    /// The server failed (HTTP 5xx or any other unexpected status).
    #[error("gateway server error (status {status})")]
    Server {
        /// HTTP status code.
        status: u16,
    },

    /// The server could not be reached, or the request timed out.
    #[error("gateway unavailable")]
    Unavailable,
}

/// One quantity change in a batch update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineChange {
    /// Product whose line is updated.
    pub product_id: ProductId,
    /// The line's new quantity.
    pub quantity: Quantity,
}

/// Contract over the server-authoritative cart.
///
/// Every method is a network round trip. `list` is the source of truth after
/// any mutation; the write operations return no snapshot by design.
#[async_trait]
pub trait CartGateway: Send + Sync {
    /// Fetch the full cart snapshot.
    async fn list(&self) -> Result<Vec<CartLineItem>, GatewayError>;

    /// Add `quantity` units of a product; the server accumulates onto any
    /// existing line.
    async fn add(&self, product_id: ProductId, quantity: Quantity) -> Result<(), GatewayError>;

    /// Apply a batch of quantity changes.
    async fn update_many(&self, changes: &[LineChange]) -> Result<(), GatewayError>;

    /// Remove a product's line entirely.
    async fn remove(&self, product_id: ProductId) -> Result<(), GatewayError>;
}

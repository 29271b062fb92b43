//! Cart and wishlist line-item shapes.
//!
//! Display fields (name, description, image) are denormalized at add-time so
//! a cart can render without a catalog lookup. The remote store may rewrite
//! them on reconciliation; the server always wins.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, Quantity};

/// Display fields captured from the catalog when a product enters the cart
/// or wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    /// Product name at add-time.
    pub name: String,
    /// Short product description at add-time.
    pub description: String,
    /// Primary product image URL.
    pub image_url: String,
}

/// One product-and-quantity entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Opaque product identifier, stable across authorities.
    pub product_id: ProductId,
    /// Denormalized display fields.
    #[serde(flatten)]
    pub display: DisplaySnapshot,
    /// Units of this product in the cart.
    pub quantity: Quantity,
    /// Unit price in minor currency units.
    pub unit_price: Price,
}

impl CartLineItem {
    /// Total price for this line (`quantity * unit_price`).
    #[must_use]
    pub const fn line_total(&self) -> Price {
        self.unit_price.saturating_mul(self.quantity.get())
    }
}

/// A liked product. Set semantics: a product is either present or absent,
/// there is no quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// Opaque product identifier.
    pub product_id: ProductId,
    /// Denormalized display fields.
    #[serde(flatten)]
    pub display: DisplaySnapshot,
}

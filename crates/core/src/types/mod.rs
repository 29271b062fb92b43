//! Core types for Opaline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod item;
pub mod price;
pub mod quantity;

pub use id::ProductId;
pub use item::{CartLineItem, DisplaySnapshot, WishlistItem};
pub use price::{Price, PriceError};
pub use quantity::{Quantity, QuantityDecision, QuantityError};

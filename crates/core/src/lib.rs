//! Opaline Core - Shared types library.
//!
//! This crate provides common types used across all Opaline components:
//! - `cart` - Cart/wishlist synchronization engine
//! - any frontend that renders its snapshots
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and quantities,
//!   plus the cart/wishlist line-item shapes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

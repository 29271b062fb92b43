//! Opaline Cart - dual-mode cart/wishlist synchronization engine.
//!
//! Keeps a shopping cart consistent across two authority sources:
//!
//! - **Local** - a durable client-side store for guest sessions
//! - **Remote** - the server-authoritative cart, reached over REST
//!
//! Mutations are applied optimistically: consumers see the expected result
//! immediately, then the engine reconciles against the active authority and
//! rolls back on failure. The wishlist is simpler - always local, set
//! semantics, no reconciliation.
//!
//! # Architecture
//!
//! - [`engine::CartSyncEngine`] - the orchestrator; owns the reconciled
//!   state and broadcasts immutable snapshots to consumers
//! - [`local::LocalCartStore`] - namespaced JSON persistence over a
//!   [`storage::StorageBackend`]
//! - [`remote::CartGateway`] - the port to the server cart, implemented for
//!   HTTP by [`remote::HttpCartGateway`]
//! - [`wishlist::WishlistStore`] - single-authority liked-products set
//!
//! # Example
//!
//! ```rust,ignore
//! use opaline_cart::engine::{Authority, CartSyncEngine, ProductDetails};
//! use opaline_cart::local::LocalCartStore;
//! use opaline_cart::remote::HttpCartGateway;
//! use opaline_cart::storage::FileBackend;
//! use opaline_core::Quantity;
//! use std::sync::Arc;
//!
//! let backend = Arc::new(FileBackend::new(&config.storage.dir));
//! let local = LocalCartStore::new(backend);
//! let gateway = HttpCartGateway::new(&config.api)?;
//! let engine = CartSyncEngine::new(local, gateway, Authority::Local).await?;
//!
//! let snapshot = engine.add_item(product, Quantity::ONE).await?;
//! assert_eq!(snapshot.cart_count(), 1);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod engine;
pub mod error;
pub mod local;
pub(crate) mod reconcile;
pub mod remote;
pub mod storage;
pub mod wishlist;

pub use config::{CartApiConfig, ConfigError, StorageConfig};
pub use engine::{Authority, CartSnapshot, CartSyncEngine, ProductDetails};
pub use error::{CartError, ErrorKind};
pub use local::LocalCartStore;
pub use remote::{CartGateway, GatewayError, HttpCartGateway, LineChange};
pub use storage::{FileBackend, MemoryBackend, StorageBackend, StorageError};
pub use wishlist::WishlistStore;

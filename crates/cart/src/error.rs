//! Unified error handling for the cart engine.
//!
//! Every public operation returns `Result<T, CartError>`. Validation errors
//! are rejected before any I/O; gateway and storage failures are mapped into
//! the same taxonomy so callers branch on one type regardless of which
//! authority was active.

use thiserror::Error;

use opaline_core::{ProductId, QuantityError};

use crate::remote::GatewayError;
use crate::storage::StorageError;

/// Engine-level error type for cart and wishlist operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested quantity could not be coerced to an integer.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// The requested quantity exceeds the per-line maximum.
    #[error("quantity {requested} is out of range")]
    QuantityOutOfRange {
        /// The rejected quantity.
        requested: i64,
    },

    /// Another mutation on the same product is still in flight.
    #[error("operation already in progress for product {product_id}")]
    OperationInProgress {
        /// Product whose pending operation blocked this call.
        product_id: ProductId,
    },

    /// The remote authority rejected the credential.
    #[error("unauthorized")]
    Unauthorized,

    /// The product or cart was not found.
    #[error("not found")]
    NotFound,

    /// The remote authority failed server-side.
    #[error("server error (status {status})")]
    ServerError {
        /// HTTP status returned by the server.
        status: u16,
    },

    /// The remote authority could not be reached (includes timeouts).
    #[error("network unavailable")]
    NetworkUnavailable,

    /// Writing to the local store failed.
    #[error("persistence failed: {0}")]
    PersistenceFailed(#[source] StorageError),

    /// Persisted local state could not be parsed.
    ///
    /// Recovered by resetting to an empty collection; surfaced as a warning,
    /// never as a mutation failure.
    #[error("corrupt persisted state")]
    CorruptPersistedState,
}

impl CartError {
    /// The payload-free kind of this error, suitable for `last_error`
    /// snapshots handed to consumers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuantity(_) => ErrorKind::InvalidQuantity,
            Self::QuantityOutOfRange { .. } => ErrorKind::QuantityOutOfRange,
            Self::OperationInProgress { .. } => ErrorKind::OperationInProgress,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::NotFound => ErrorKind::NotFound,
            Self::ServerError { .. } => ErrorKind::ServerError,
            Self::NetworkUnavailable => ErrorKind::NetworkUnavailable,
            Self::PersistenceFailed(_) => ErrorKind::PersistenceFailed,
            Self::CorruptPersistedState => ErrorKind::CorruptPersistedState,
        }
    }
}

/// Payload-free error discriminant carried in [`crate::CartSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`CartError::InvalidQuantity`].
    InvalidQuantity,
    /// See [`CartError::QuantityOutOfRange`].
    QuantityOutOfRange,
    /// See [`CartError::OperationInProgress`].
    OperationInProgress,
    /// See [`CartError::Unauthorized`].
    Unauthorized,
    /// See [`CartError::NotFound`].
    NotFound,
    /// See [`CartError::ServerError`].
    ServerError,
    /// See [`CartError::NetworkUnavailable`].
    NetworkUnavailable,
    /// See [`CartError::PersistenceFailed`].
    PersistenceFailed,
    /// See [`CartError::CorruptPersistedState`].
    CorruptPersistedState,
}

impl From<QuantityError> for CartError {
    fn from(err: QuantityError) -> Self {
        match err {
            QuantityError::Invalid { input } => Self::InvalidQuantity(input),
            QuantityError::OutOfRange { requested } => Self::QuantityOutOfRange { requested },
        }
    }
}

impl From<GatewayError> for CartError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unauthorized => Self::Unauthorized,
            GatewayError::NotFound => Self::NotFound,
            GatewayError::Server { status } => Self::ServerError { status },
            GatewayError::Unavailable => Self::NetworkUnavailable,
        }
    }
}

impl From<StorageError> for CartError {
    fn from(err: StorageError) -> Self {
        Self::PersistenceFailed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_error_mapping() {
        let err = CartError::from(QuantityError::OutOfRange { requested: 42 });
        assert!(matches!(
            err,
            CartError::QuantityOutOfRange { requested: 42 }
        ));
        assert_eq!(err.kind(), ErrorKind::QuantityOutOfRange);

        let err = CartError::from(QuantityError::Invalid {
            input: "many".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::InvalidQuantity);
    }

    #[test]
    fn test_gateway_error_mapping() {
        assert_eq!(
            CartError::from(GatewayError::Unauthorized).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            CartError::from(GatewayError::Server { status: 503 }).kind(),
            ErrorKind::ServerError
        );
        assert_eq!(
            CartError::from(GatewayError::Unavailable).kind(),
            ErrorKind::NetworkUnavailable
        );
        assert_eq!(
            CartError::from(GatewayError::NotFound).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_error_display() {
        let err = CartError::ServerError { status: 500 };
        assert_eq!(err.to_string(), "server error (status 500)");

        let err = CartError::OperationInProgress {
            product_id: ProductId::new(7),
        };
        assert_eq!(
            err.to_string(),
            "operation already in progress for product 7"
        );
    }
}

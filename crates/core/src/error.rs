//! Domain error model.

use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the cart/catalog domain.
pub type CartResult<T> = Result<T, CartError>;

/// Closed set of failure kinds reported by the cart and catalog.
///
/// Backend-specific errors (SQL, lock poisoning, timeouts) never leak through
/// this type; infrastructure maps them into `Persistence` with a retry hint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Malformed input (e.g. a non-positive quantity). Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown product or cart item.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Requested quantity exceeds what the product currently has free.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// Storage failure (lock timeout, connectivity, transaction conflict).
    ///
    /// No partial effect survives, so a `retryable` failure can be retried
    /// from scratch.
    #[error("persistence failure: {message}")]
    Persistence { message: String, retryable: bool },
}

impl CartError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn product_not_found(id: ProductId) -> Self {
        Self::NotFound {
            entity: "product",
            id: id.to_string(),
        }
    }

    pub fn cart_item_not_found(id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            entity: "cart item",
            id: id.to_string(),
        }
    }

    pub fn persistence(msg: impl Into<String>, retryable: bool) -> Self {
        Self::Persistence {
            message: msg.into(),
            retryable,
        }
    }

    /// Whether the whole operation may be safely re-run.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { retryable: true, .. })
    }
}

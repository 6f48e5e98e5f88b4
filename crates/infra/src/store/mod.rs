//! Persistence boundary for the catalog and the cart.
//!
//! The cart core never talks to a database directly. It talks to a
//! [`CartStore`], which hands out [`AtomicUnit`]s: a unit groups reads and
//! writes that either all take effect on [`AtomicUnit::commit`] or none do.
//!
//! ## Locking contract
//!
//! `*_for_update` reads inside a unit take an exclusive lock on the row they
//! return, held until the unit ends. Every stock read-check-write must go
//! through such a read, so two units reserving the same product serialise
//! instead of both trusting a stale level.
//!
//! Lock waits are bounded. A wait that runs out surfaces as
//! [`StoreError::LockTimeout`], which callers may retry from scratch.
//!
//! ## Dropping a unit
//!
//! A unit dropped without `commit` rolls back. Nothing partially applied is
//! ever visible to other units or to plain reads.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryCartStore;
pub use postgres::PostgresCartStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockcart_cart::{CartItem, JoinedLine};
use stockcart_catalog::Product;
use stockcart_core::{CartError, CartItemId, ProductId, Quantity, StockLevel};

/// Storage-level failure.
///
/// Kept separate from [`CartError`] so backend details stay inside infra;
/// the conversion below decides what is retryable.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("lock wait timed out in {0}")]
    LockTimeout(String),

    /// Serialization failure or deadlock; the whole unit can be re-run.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// A storage-level constraint rejected the write.
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::LockTimeout(_) | StoreError::Conflict(_) => true,
            StoreError::Constraint(_) => false,
            // Connectivity problems clear up on their own often enough.
            StoreError::Backend(_) => true,
        }
    }
}

impl From<StoreError> for CartError {
    fn from(value: StoreError) -> Self {
        let retryable = value.is_retryable();
        CartError::persistence(value.to_string(), retryable)
    }
}

/// Handle to the backing store for products and cart lines.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Start an atomic unit.
    async fn begin(&self) -> Result<Box<dyn AtomicUnit>, StoreError>;

    /// Every cart line left-joined with its product.
    ///
    /// Not linearizable with in-flight units; each row reflects some committed
    /// state.
    async fn list_cart_lines(&self) -> Result<Vec<JoinedLine>, StoreError>;

    /// All products, oldest first.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
}

#[async_trait]
impl<S> CartStore for Arc<S>
where
    S: CartStore + ?Sized,
{
    async fn begin(&self) -> Result<Box<dyn AtomicUnit>, StoreError> {
        (**self).begin().await
    }

    async fn list_cart_lines(&self) -> Result<Vec<JoinedLine>, StoreError> {
        (**self).list_cart_lines().await
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list_products().await
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).product(id).await
    }
}

/// A group of reads and writes that commits or rolls back as one.
#[async_trait]
pub trait AtomicUnit: Send {
    /// Read a product and hold an exclusive lock on it until the unit ends.
    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Read a cart line and hold an exclusive lock on it until the unit ends.
    async fn cart_item_for_update(&mut self, id: CartItemId) -> Result<Option<CartItem>, StoreError>;

    /// Set a product's free stock. Returns `false` if the product is gone.
    async fn update_stock(&mut self, id: ProductId, level: StockLevel) -> Result<bool, StoreError>;

    async fn insert_cart_item(&mut self, item: &CartItem) -> Result<(), StoreError>;

    /// Returns `false` if no such line exists.
    async fn update_cart_item(&mut self, id: CartItemId, quantity: Quantity) -> Result<bool, StoreError>;

    /// Returns `false` if no such line exists.
    async fn delete_cart_item(&mut self, id: CartItemId) -> Result<bool, StoreError>;

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError>;

    /// Overwrite every catalog field. Returns `false` if the product is gone.
    async fn replace_product(&mut self, product: &Product) -> Result<bool, StoreError>;

    /// Returns `false` if no such product exists.
    async fn delete_product(&mut self, id: ProductId) -> Result<bool, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// End a unit: commit on success, roll back on failure.
///
/// A failed rollback is only logged; the caller still gets the original error,
/// and the backend discards the unit's writes when the transaction is dropped.
pub async fn settle<T>(
    unit: Box<dyn AtomicUnit>,
    result: Result<T, CartError>,
) -> Result<T, CartError> {
    match result {
        Ok(value) => {
            unit.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = unit.rollback().await {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

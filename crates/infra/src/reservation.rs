//! Reservation coordinator: keeps cart lines and product stock consistent.
//!
//! Every operation here follows the same shape:
//!
//! ```text
//! validate input (no IO)
//!   ↓
//! begin atomic unit
//!   ↓
//! lock the cart line and/or product row (`*_for_update`)
//!   ↓
//! decide the new stock level (pure, `stockcart_cart::reservation`)
//!   ↓
//! write stock + write ledger line
//!   ↓
//! commit (or roll back both on any failure)
//! ```
//!
//! Reading stock and inserting a line as two independent steps would let two
//! concurrent requests both see enough stock and both succeed. Holding the
//! product lock from the read until commit makes the second request observe
//! the first one's result instead.
//!
//! Locks are always taken cart line first, then product, so two units never
//! wait on each other in opposite order.

use tracing::instrument;

use stockcart_cart::reservation;
use stockcart_core::{CartError, CartItemId, CartResult, ProductId, Quantity};

use crate::ledger;
use crate::store::{settle, AtomicUnit, CartStore};

/// Stock-aware cart operations.
#[derive(Debug, Clone)]
pub struct ReservationCoordinator<S> {
    store: S,
}

impl<S> ReservationCoordinator<S>
where
    S: CartStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Reserve `requested` units of a product as a new cart line.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, product_id: ProductId, requested: i64) -> CartResult<CartItemId> {
        let requested = Quantity::new(requested)?;

        let mut unit = self.store.begin().await?;
        let result = add_in(unit.as_mut(), product_id, requested).await;
        let result = settle(unit, result).await;

        match &result {
            Ok(id) => tracing::info!(cart_item_id = %id, quantity = %requested, "stock reserved"),
            Err(err) => log_rejection("add_to_cart", err),
        }
        result
    }

    /// Resize a cart line, claiming or returning the difference.
    #[instrument(skip(self))]
    pub async fn change_quantity(&self, id: CartItemId, new_quantity: i64) -> CartResult<()> {
        let new_quantity = Quantity::new(new_quantity)?;

        let mut unit = self.store.begin().await?;
        let result = change_in(unit.as_mut(), id, new_quantity).await;
        let result = settle(unit, result).await;

        match &result {
            Ok(()) => tracing::info!(quantity = %new_quantity, "reservation adjusted"),
            Err(err) => log_rejection("change_quantity", err),
        }
        result
    }

    /// Delete a cart line and give its units back to the product.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, id: CartItemId) -> CartResult<()> {
        let mut unit = self.store.begin().await?;
        let result = remove_in(unit.as_mut(), id).await;
        let result = settle(unit, result).await;

        match &result {
            Ok(()) => tracing::info!("reservation released"),
            Err(err) => log_rejection("remove_from_cart", err),
        }
        result
    }
}

async fn add_in(
    unit: &mut dyn AtomicUnit,
    product_id: ProductId,
    requested: Quantity,
) -> CartResult<CartItemId> {
    let product = unit
        .product_for_update(product_id)
        .await?
        .ok_or_else(|| CartError::product_not_found(product_id))?;

    let remaining = reservation::reserve(product_id, product.stock_level, requested)?;
    unit.update_stock(product_id, remaining).await?;
    ledger::insert_line_in(unit, product_id, requested).await
}

async fn change_in(unit: &mut dyn AtomicUnit, id: CartItemId, new_quantity: Quantity) -> CartResult<()> {
    let item = unit
        .cart_item_for_update(id)
        .await?
        .ok_or_else(|| CartError::cart_item_not_found(id))?;

    // A line whose product is gone cannot be re-validated, so it cannot change.
    let product = unit
        .product_for_update(item.product_id)
        .await?
        .ok_or_else(|| CartError::product_not_found(item.product_id))?;

    if new_quantity == item.quantity {
        return Ok(());
    }

    let stock = reservation::adjust(item.product_id, product.stock_level, item.quantity, new_quantity)?;
    unit.update_stock(item.product_id, stock).await?;
    ledger::set_quantity_in(unit, id, new_quantity).await
}

async fn remove_in(unit: &mut dyn AtomicUnit, id: CartItemId) -> CartResult<()> {
    let item = unit
        .cart_item_for_update(id)
        .await?
        .ok_or_else(|| CartError::cart_item_not_found(id))?;

    match unit.product_for_update(item.product_id).await? {
        Some(product) => {
            let stock = reservation::release(product.stock_level, item.quantity)?;
            unit.update_stock(item.product_id, stock).await?;
        }
        None => {
            tracing::warn!(product_id = %item.product_id, "removing line for deleted product; nothing to restore");
        }
    }

    ledger::remove_line_in(unit, id).await
}

fn log_rejection(operation: &'static str, err: &CartError) {
    match err {
        CartError::Persistence { retryable, .. } => {
            tracing::error!(operation, retryable, error = %err, "cart operation failed")
        }
        _ => tracing::debug!(operation, error = %err, "cart operation rejected"),
    }
}

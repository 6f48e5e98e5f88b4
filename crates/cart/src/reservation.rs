//! Stock arithmetic for reservations.
//!
//! These functions decide the product's new free stock level for each cart
//! operation, or reject it. They do not lock or persist anything: callers must
//! run the read, the decision and both writes inside one atomic unit.

use stockcart_core::{CartError, CartResult, ProductId, Quantity, StockLevel};

/// Claim `requested` units from `stock`.
pub fn reserve(product_id: ProductId, stock: StockLevel, requested: Quantity) -> CartResult<StockLevel> {
    stock
        .checked_take(requested.get())
        .ok_or(CartError::InsufficientStock {
            product_id,
            requested: requested.get(),
            available: stock.get(),
        })
}

/// Move a line from `current` to `new` units.
///
/// Growing the line claims the difference (and can fail); shrinking it
/// returns the difference to stock.
pub fn adjust(
    product_id: ProductId,
    stock: StockLevel,
    current: Quantity,
    new: Quantity,
) -> CartResult<StockLevel> {
    let delta = new.get() - current.get();
    if delta > 0 {
        stock.checked_take(delta).ok_or(CartError::InsufficientStock {
            product_id,
            requested: delta,
            available: stock.get(),
        })
    } else {
        stock.put_back(-delta)
    }
}

/// Give a removed line's units back to stock.
pub fn release(stock: StockLevel, quantity: Quantity) -> CartResult<StockLevel> {
    stock.put_back(quantity.get())
}

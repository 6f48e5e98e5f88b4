use chrono::{DateTime, Utc};

use stockcart_core::{CartItemId, ProductId, Quantity};

/// A cart line: an exclusive claim on `quantity` units of one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: CartItemId,
    /// Weak reference; the product may have been deleted since.
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn new(id: CartItemId, product_id: ProductId, quantity: Quantity, added_at: DateTime<Utc>) -> Self {
        Self {
            id,
            product_id,
            quantity,
            added_at,
        }
    }
}

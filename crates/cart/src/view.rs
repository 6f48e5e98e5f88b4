//! Derived cart view.
//!
//! Subtotals and the total are recomputed from current product/line state on
//! every view and never stored.

use stockcart_core::{CartItemId, Money, ProductId, Quantity};

use crate::item::CartItem;

/// The product columns a cart line needs for display and pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineProduct {
    pub name: String,
    pub price: Money,
}

/// A cart line left-joined with its product (`None` when the product is gone).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedLine {
    pub item: CartItem,
    pub product: Option<LineProduct>,
}

/// One priced line of the cart view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Money,
    pub quantity: Quantity,
    pub subtotal: Money,
}

impl CartLine {
    pub fn priced(item: &CartItem, product: &LineProduct) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: product.name.clone(),
            price: product.price,
            quantity: item.quantity,
            subtotal: product.price.times(item.quantity),
        }
    }
}

/// Priced cart contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: Money,
    /// Lines whose product no longer exists; excluded from `items` and `total`.
    pub stale_items: Vec<CartItemId>,
}

impl CartView {
    /// Price every joined line, skipping orphans.
    ///
    /// Lines are ordered by the time they were added, then by id.
    pub fn from_joined(mut rows: Vec<JoinedLine>) -> Self {
        rows.sort_by(|a, b| {
            a.item
                .added_at
                .cmp(&b.item.added_at)
                .then_with(|| a.item.id.cmp(&b.item.id))
        });

        let mut items = Vec::with_capacity(rows.len());
        let mut stale_items = Vec::new();
        for row in &rows {
            match &row.product {
                Some(product) => items.push(CartLine::priced(&row.item, product)),
                None => stale_items.push(row.item.id),
            }
        }

        let total = items.iter().map(|l| l.subtotal).sum();
        Self {
            items,
            total,
            stale_items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

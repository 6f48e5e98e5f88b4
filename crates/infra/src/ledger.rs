//! Cart ledger: plain CRUD over cart lines plus the priced cart view.
//!
//! The ledger is a dumb store. It validates quantities but knows nothing
//! about stock; the reservation coordinator pairs every ledger write with the
//! matching stock change inside one atomic unit, using the `*_in` functions
//! below.

use chrono::Utc;
use tracing::instrument;

use stockcart_cart::{CartItem, CartView};
use stockcart_core::{CartError, CartItemId, CartResult, ProductId, Quantity};

use crate::store::{settle, AtomicUnit, CartStore};

/// Insert a new line inside an open unit. The id is allocated here.
pub async fn insert_line_in(
    unit: &mut dyn AtomicUnit,
    product_id: ProductId,
    quantity: Quantity,
) -> CartResult<CartItemId> {
    let item = CartItem::new(CartItemId::new(), product_id, quantity, Utc::now());
    unit.insert_cart_item(&item).await?;
    Ok(item.id)
}

/// Overwrite a line's quantity inside an open unit.
pub async fn set_quantity_in(
    unit: &mut dyn AtomicUnit,
    id: CartItemId,
    quantity: Quantity,
) -> CartResult<()> {
    if !unit.update_cart_item(id, quantity).await? {
        return Err(CartError::cart_item_not_found(id));
    }
    Ok(())
}

/// Delete a line inside an open unit.
pub async fn remove_line_in(unit: &mut dyn AtomicUnit, id: CartItemId) -> CartResult<()> {
    if !unit.delete_cart_item(id).await? {
        return Err(CartError::cart_item_not_found(id));
    }
    Ok(())
}

/// Standalone ledger operations, each in its own unit.
#[derive(Debug, Clone)]
pub struct CartLedger<S> {
    store: S,
}

impl<S> CartLedger<S>
where
    S: CartStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Price every line against its current product.
    ///
    /// Lines whose product was deleted are left out and listed in
    /// `stale_items`; they never fail the view.
    #[instrument(skip(self), err)]
    pub async fn view_cart(&self) -> CartResult<CartView> {
        let rows = self.store.list_cart_lines().await?;
        let view = CartView::from_joined(rows);
        if !view.stale_items.is_empty() {
            tracing::warn!(
                stale = view.stale_items.len(),
                "cart contains lines for deleted products"
            );
        }
        Ok(view)
    }

    /// Append a line without touching stock.
    pub async fn insert_line(&self, product_id: ProductId, quantity: i64) -> CartResult<CartItemId> {
        let quantity = Quantity::new(quantity)?;
        let mut unit = self.store.begin().await?;
        let result = insert_line_in(unit.as_mut(), product_id, quantity).await;
        settle(unit, result).await
    }

    /// Overwrite a line's quantity without touching stock.
    pub async fn set_quantity(&self, id: CartItemId, quantity: i64) -> CartResult<()> {
        let quantity = Quantity::new(quantity)?;
        let mut unit = self.store.begin().await?;
        let result = set_quantity_in(unit.as_mut(), id, quantity).await;
        settle(unit, result).await
    }

    /// Delete a line without touching stock.
    pub async fn remove_line(&self, id: CartItemId) -> CartResult<()> {
        let mut unit = self.store.begin().await?;
        let result = remove_line_in(unit.as_mut(), id).await;
        settle(unit, result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCartStore;
    use stockcart_core::Money;

    fn ledger() -> CartLedger<InMemoryCartStore> {
        CartLedger::new(InMemoryCartStore::new())
    }

    #[tokio::test]
    async fn empty_cart_views_as_zero() {
        let view = ledger().view_cart().await.unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.total, Money::ZERO);
    }

    #[tokio::test]
    async fn insert_line_rejects_non_positive_quantity() {
        let ledger = ledger();
        for q in [0, -1] {
            let err = ledger.insert_line(ProductId::new(), q).await.unwrap_err();
            assert!(matches!(err, CartError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn set_quantity_on_missing_line_is_not_found() {
        let err = ledger().set_quantity(CartItemId::new(), 2).await.unwrap_err();
        assert!(matches!(err, CartError::NotFound { entity: "cart item", .. }));
    }

    #[tokio::test]
    async fn set_quantity_validates_before_lookup() {
        let err = ledger().set_quantity(CartItemId::new(), 0).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
    }

    #[tokio::test]
    async fn remove_line_twice_is_not_found() {
        let ledger = ledger();
        let id = ledger.insert_line(ProductId::new(), 1).await.unwrap();

        ledger.remove_line(id).await.unwrap();
        let err = ledger.remove_line(id).await.unwrap_err();
        assert!(matches!(err, CartError::NotFound { .. }));
    }

    #[tokio::test]
    async fn lines_without_products_are_stale_in_view() {
        let ledger = ledger();
        let id = ledger.insert_line(ProductId::new(), 2).await.unwrap();

        let view = ledger.view_cart().await.unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.stale_items, vec![id]);
        assert_eq!(view.total, Money::ZERO);
    }
}

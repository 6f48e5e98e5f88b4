//! Catalog management: product CRUD.
//!
//! Catalog writes take the same product row lock as reservations, so an
//! update that resets `stock_level` never interleaves with a reservation's
//! read-check-write on that product.

use chrono::Utc;
use tracing::instrument;

use stockcart_catalog::{NewProduct, Product};
use stockcart_core::{CartError, CartResult, ProductId};

use crate::store::{settle, AtomicUnit, CartStore};

#[derive(Debug, Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S> CatalogService<S>
where
    S: CartStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn list_products(&self) -> CartResult<Vec<Product>> {
        Ok(self.store.list_products().await?)
    }

    pub async fn get_product(&self, id: ProductId) -> CartResult<Product> {
        self.store
            .product(id)
            .await?
            .ok_or_else(|| CartError::product_not_found(id))
    }

    #[instrument(skip(self, fields), fields(sku = %fields.sku))]
    pub async fn create_product(&self, fields: NewProduct) -> CartResult<ProductId> {
        let product = Product::create(ProductId::new(), fields, Utc::now());

        let mut unit = self.store.begin().await?;
        let result = unit.insert_product(&product).await.map_err(CartError::from);
        settle(unit, result).await?;

        tracing::info!(product_id = %product.id, stock = %product.stock_level, "product created");
        Ok(product.id)
    }

    /// Replace every catalog field, including the free stock level.
    #[instrument(skip(self, fields))]
    pub async fn update_product(&self, id: ProductId, fields: NewProduct) -> CartResult<()> {
        let mut unit = self.store.begin().await?;
        let result = update_in(unit.as_mut(), id, fields).await;
        settle(unit, result).await?;

        tracing::info!(product_id = %id, "product updated");
        Ok(())
    }

    /// Delete a product. Cart lines that reference it become orphans.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> CartResult<()> {
        let mut unit = self.store.begin().await?;
        let result = delete_in(unit.as_mut(), id).await;
        settle(unit, result).await?;

        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

async fn update_in(unit: &mut dyn AtomicUnit, id: ProductId, fields: NewProduct) -> CartResult<()> {
    let mut product = unit
        .product_for_update(id)
        .await?
        .ok_or_else(|| CartError::product_not_found(id))?;
    product.replace(fields);
    if !unit.replace_product(&product).await? {
        return Err(CartError::product_not_found(id));
    }
    Ok(())
}

async fn delete_in(unit: &mut dyn AtomicUnit, id: ProductId) -> CartResult<()> {
    if unit.product_for_update(id).await?.is_none() {
        return Err(CartError::product_not_found(id));
    }
    unit.delete_product(id).await?;
    Ok(())
}

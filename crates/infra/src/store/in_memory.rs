use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock, RwLockReadGuard};

use stockcart_cart::{CartItem, JoinedLine, LineProduct};
use stockcart_catalog::Product;
use stockcart_core::{CartItemId, ProductId, Quantity, StockLevel};

use super::{AtomicUnit, CartStore, StoreError};

/// Default bound on waiting for the store lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default)]
struct Tables {
    products: HashMap<ProductId, Product>,
    cart_items: HashMap<CartItemId, CartItem>,
}

/// In-memory product + cart store.
///
/// Intended for tests/dev. A unit owns the whole store's write lock for its
/// lifetime, which is coarser than row locking but gives the same guarantee:
/// no two units interleave their read-check-write. Writes are staged on a copy
/// and swapped in on commit, so an abandoned unit leaves no trace.
#[derive(Debug, Clone)]
pub struct InMemoryCartStore {
    tables: Arc<RwLock<Tables>>,
    lock_timeout: Duration,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            lock_timeout,
        }
    }

    async fn read(&self, operation: &str) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        tokio::time::timeout(self.lock_timeout, self.tables.read())
            .await
            .map_err(|_| StoreError::LockTimeout(operation.to_string()))
    }
}

impl Default for InMemoryCartStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn begin(&self) -> Result<Box<dyn AtomicUnit>, StoreError> {
        let guard = tokio::time::timeout(self.lock_timeout, self.tables.clone().write_owned())
            .await
            .map_err(|_| StoreError::LockTimeout("begin".to_string()))?;
        let staged = Tables::clone(&guard);
        Ok(Box::new(InMemoryUnit { guard, staged }))
    }

    async fn list_cart_lines(&self) -> Result<Vec<JoinedLine>, StoreError> {
        let tables = self.read("list_cart_lines").await?;
        Ok(tables
            .cart_items
            .values()
            .map(|item| JoinedLine {
                item: item.clone(),
                product: tables.products.get(&item.product_id).map(|p| LineProduct {
                    name: p.name.clone(),
                    price: p.price,
                }),
            })
            .collect())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let tables = self.read("list_products").await?;
        let mut products: Vec<Product> = tables.products.values().cloned().collect();
        products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let tables = self.read("product").await?;
        Ok(tables.products.get(&id).cloned())
    }
}

struct InMemoryUnit {
    guard: OwnedRwLockWriteGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl AtomicUnit for InMemoryUnit {
    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.staged.products.get(&id).cloned())
    }

    async fn cart_item_for_update(&mut self, id: CartItemId) -> Result<Option<CartItem>, StoreError> {
        Ok(self.staged.cart_items.get(&id).cloned())
    }

    async fn update_stock(&mut self, id: ProductId, level: StockLevel) -> Result<bool, StoreError> {
        match self.staged.products.get_mut(&id) {
            Some(p) => {
                p.stock_level = level;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_cart_item(&mut self, item: &CartItem) -> Result<(), StoreError> {
        if self.staged.cart_items.contains_key(&item.id) {
            return Err(StoreError::Constraint(format!("duplicate cart item id {}", item.id)));
        }
        self.staged.cart_items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_cart_item(&mut self, id: CartItemId, quantity: Quantity) -> Result<bool, StoreError> {
        match self.staged.cart_items.get_mut(&id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_cart_item(&mut self, id: CartItemId) -> Result<bool, StoreError> {
        Ok(self.staged.cart_items.remove(&id).is_some())
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        if self.staged.products.contains_key(&product.id) {
            return Err(StoreError::Constraint(format!("duplicate product id {}", product.id)));
        }
        self.staged.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn replace_product(&mut self, product: &Product) -> Result<bool, StoreError> {
        match self.staged.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool, StoreError> {
        Ok(self.staged.products.remove(&id).is_some())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryUnit { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

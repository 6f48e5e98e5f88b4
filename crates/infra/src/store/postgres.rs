//! Postgres-backed product + cart store.
//!
//! Each [`AtomicUnit`] is one database transaction. Row locks come from
//! `SELECT … FOR UPDATE`, and lock waits are bounded per transaction with
//! `lock_timeout` so a stuck holder turns into a retryable error instead of a
//! hung request.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (lock not available) | `55P03` | `LockTimeout` | `lock_timeout` expired waiting for a row lock |
//! | Database (serialization failure) | `40001` | `Conflict` | Concurrent transaction conflict |
//! | Database (deadlock detected) | `40P01` | `Conflict` | Lock cycle broken by the server |
//! | Database (unique / check / fk) | `23505` / `23514` / `23503` | `Constraint` | Write rejected by schema |
//! | Database (other) | Any other | `Backend` | Other database errors |
//! | PoolTimedOut | N/A | `LockTimeout` | No pooled connection became free in time |
//! | Other | N/A | `Backend` | Network errors, pool closed, etc. |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use stockcart_cart::{CartItem, JoinedLine, LineProduct};
use stockcart_catalog::Product;
use stockcart_core::{CartItemId, Money, ProductId, Quantity, StockLevel};

use super::{AtomicUnit, CartStore, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id           UUID PRIMARY KEY,
        sku          TEXT NOT NULL,
        name         TEXT NOT NULL,
        description  TEXT NULL,
        price        BIGINT NOT NULL CHECK (price >= 0),
        stock_level  BIGINT NOT NULL CHECK (stock_level >= 0),
        category_id  TEXT NULL,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cart_items (
        id          UUID PRIMARY KEY,
        product_id  UUID NOT NULL,
        quantity    BIGINT NOT NULL CHECK (quantity > 0),
        added_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS cart_items_product_id_idx ON cart_items (product_id)",
];

/// Postgres-backed store.
///
/// `cart_items.product_id` deliberately carries no foreign key: deleting a
/// product leaves its lines in place as orphans, which the cart view skips.
#[derive(Debug, Clone)]
pub struct PostgresCartStore {
    pool: Arc<PgPool>,
    lock_timeout: Duration,
}

impl PostgresCartStore {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self {
            pool: Arc::new(pool),
            lock_timeout,
        }
    }

    /// Open a connection pool. Pool acquisition shares the lock wait bound.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        lock_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(lock_timeout)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool, lock_timeout))
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    #[instrument(skip(self), err)]
    async fn begin(&self) -> Result<Box<dyn AtomicUnit>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_lock_timeout", e))?;

        Ok(Box::new(PostgresUnit { tx }))
    }

    #[instrument(skip(self), err)]
    async fn list_cart_lines(&self) -> Result<Vec<JoinedLine>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                ci.id,
                ci.product_id,
                ci.quantity,
                ci.added_at,
                p.name AS product_name,
                p.price AS product_price
            FROM cart_items ci
            LEFT JOIN products p ON p.id = ci.product_id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_cart_lines", e))?;

        rows.iter()
            .map(|row| -> Result<JoinedLine, StoreError> {
                let item: CartItem = CartItemRow::from_row(row)
                    .map_err(|e| StoreError::Backend(format!("failed to read cart line row: {e}")))?
                    .try_into()?;
                let name: Option<String> = row
                    .try_get("product_name")
                    .map_err(|e| StoreError::Backend(format!("failed to read product_name: {e}")))?;
                let price: Option<i64> = row
                    .try_get("product_price")
                    .map_err(|e| StoreError::Backend(format!("failed to read product_price: {e}")))?;
                let product = match (name, price) {
                    (Some(name), Some(price)) => Some(LineProduct {
                        name,
                        price: money_from_column(price)?,
                    }),
                    _ => None,
                };
                Ok(JoinedLine { item, product })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, sku, name, description, price, stock_level, category_id, created_at
            FROM products
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, sku, name, description, price, stock_level, category_id, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }
}

struct PostgresUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AtomicUnit for PostgresUnit {
    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, sku, name, description, price, stock_level, category_id, created_at
            FROM products
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("product_for_update", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn cart_item_for_update(&mut self, id: CartItemId) -> Result<Option<CartItem>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, product_id, quantity, added_at
            FROM cart_items
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("cart_item_for_update", e))?;

        match row {
            Some(row) => {
                let item = CartItemRow::from_row(&row)
                    .map_err(|e| StoreError::Backend(format!("failed to read cart item row: {e}")))?;
                Ok(Some(item.try_into()?))
            }
            None => Ok(None),
        }
    }

    async fn update_stock(&mut self, id: ProductId, level: StockLevel) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE products SET stock_level = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(level.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_stock", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_cart_item(&mut self, item: &CartItem) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, product_id, quantity, added_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.quantity.get())
        .bind(item.added_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_cart_item", e))?;
        Ok(())
    }

    async fn update_cart_item(&mut self, id: CartItemId, quantity: Quantity) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(quantity.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("update_cart_item", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_cart_item(&mut self, id: CartItemId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_cart_item", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, description, price, stock_level, category_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(money_to_column(product.price)?)
        .bind(product.stock_level.get())
        .bind(&product.category_id)
        .bind(product.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    async fn replace_product(&mut self, product: &Product) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET sku = $2,
                name = $3,
                description = $4,
                price = $5,
                stock_level = $6,
                category_id = $7
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(money_to_column(product.price)?)
        .bind(product.stock_level.get())
        .bind(&product.category_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("replace_product", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn money_from_column(value: i64) -> Result<Money, StoreError> {
    u64::try_from(value)
        .map(Money::from_minor)
        .map_err(|_| StoreError::Backend(format!("negative price in storage: {value}")))
}

fn money_to_column(value: Money) -> Result<i64, StoreError> {
    i64::try_from(value.minor())
        .map_err(|_| StoreError::Constraint(format!("price {value} does not fit a BIGINT column")))
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    ProductRow::from_row(row)
        .map_err(|e| StoreError::Backend(format!("failed to read product row: {e}")))?
        .try_into()
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("55P03") => StoreError::LockTimeout(operation.to_string()),
                Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                Some("23505") | Some("23514") | Some("23503") => StoreError::Constraint(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolTimedOut => StoreError::LockTimeout(format!("{operation} (connection pool)")),
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: uuid::Uuid,
    sku: String,
    name: String,
    description: Option<String>,
    price: i64,
    stock_level: i64,
    category_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            stock_level: row.try_get("stock_level")?,
            category_id: row.try_get("category_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let stock_level = StockLevel::new(row.stock_level)
            .map_err(|e| StoreError::Backend(format!("corrupt product row {}: {e}", row.id)))?;
        Ok(Product {
            id: ProductId::from_uuid(row.id),
            sku: row.sku,
            name: row.name,
            description: row.description,
            price: money_from_column(row.price)?,
            stock_level,
            category_id: row.category_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug)]
struct CartItemRow {
    id: uuid::Uuid,
    product_id: uuid::Uuid,
    quantity: i64,
    added_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for CartItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CartItemRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            added_at: row.try_get("added_at")?,
        })
    }
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = StoreError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity)
            .map_err(|e| StoreError::Backend(format!("corrupt cart item row {}: {e}", row.id)))?;
        Ok(CartItem::new(
            CartItemId::from_uuid(row.id),
            ProductId::from_uuid(row.product_id),
            quantity,
            row.added_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_price_column_is_rejected() {
        assert!(money_from_column(-1).is_err());
        assert_eq!(money_from_column(250).unwrap(), Money::from_minor(250));
    }

    #[test]
    fn oversized_price_does_not_fit_column() {
        assert!(matches!(
            money_to_column(Money::from_minor(u64::MAX)),
            Err(StoreError::Constraint(_))
        ));
    }

    #[test]
    fn pool_exhaustion_is_retryable() {
        let err = map_sqlx_error("begin_transaction", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::LockTimeout(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn corrupt_quantity_row_is_reported() {
        let row = CartItemRow {
            id: uuid::Uuid::now_v7(),
            product_id: uuid::Uuid::now_v7(),
            quantity: 0,
            added_at: Utc::now(),
        };
        assert!(CartItem::try_from(row).is_err());
    }
}

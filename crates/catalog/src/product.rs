use chrono::{DateTime, Utc};

use stockcart_core::{CartError, CartResult, Money, ProductId, StockLevel};

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    /// Unit price in minor currency units.
    pub price: Money,
    /// Units free for reservation (reserved units live on cart lines).
    pub stock_level: StockLevel,
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Materialize a new catalog record from validated fields.
    pub fn create(id: ProductId, fields: NewProduct, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            sku: fields.sku,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            stock_level: fields.stock_level,
            category_id: fields.category_id,
            created_at,
        }
    }

    /// Replace every catalog-managed field, keeping identity and creation time.
    pub fn replace(&mut self, fields: NewProduct) {
        self.sku = fields.sku;
        self.name = fields.name;
        self.description = fields.description;
        self.price = fields.price;
        self.stock_level = fields.stock_level;
        self.category_id = fields.category_id;
    }
}

/// Catalog-managed fields of a product, validated.
///
/// Used both for creation and for full replacement on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock_level: StockLevel,
    pub category_id: Option<String>,
}

impl NewProduct {
    /// Validate raw catalog input.
    ///
    /// `price` and `stock_level` arrive signed so a negative value is reported
    /// as a validation failure instead of a decoding failure.
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
        price: i64,
        stock_level: i64,
        category_id: Option<String>,
    ) -> CartResult<Self> {
        let sku = sku.into().trim().to_string();
        let name = name.into().trim().to_string();

        if sku.is_empty() {
            return Err(CartError::validation("sku cannot be empty"));
        }
        if name.is_empty() {
            return Err(CartError::validation("name cannot be empty"));
        }
        if price < 0 {
            return Err(CartError::validation(format!(
                "price cannot be negative, got {price}"
            )));
        }
        let stock_level = StockLevel::new(stock_level)?;

        Ok(Self {
            sku,
            name,
            description: description.filter(|d| !d.trim().is_empty()),
            price: Money::from_minor(price as u64),
            stock_level,
            category_id: category_id.filter(|c| !c.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(price: i64, stock: i64) -> CartResult<NewProduct> {
        NewProduct::new("W-1", "Widget", None, price, stock, None)
    }

    #[test]
    fn new_product_accepts_valid_input() {
        let p = widget(10, 5).unwrap();
        assert_eq!(p.price, Money::from_minor(10));
        assert_eq!(p.stock_level.get(), 5);
    }

    #[test]
    fn new_product_rejects_blank_name_and_sku() {
        assert!(matches!(
            NewProduct::new("  ", "Widget", None, 1, 1, None),
            Err(CartError::Validation(_))
        ));
        assert!(matches!(
            NewProduct::new("W-1", "   ", None, 1, 1, None),
            Err(CartError::Validation(_))
        ));
    }

    #[test]
    fn new_product_rejects_negative_price_and_stock() {
        assert!(matches!(widget(-1, 5), Err(CartError::Validation(_))));
        assert!(matches!(widget(10, -1), Err(CartError::Validation(_))));
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let p = NewProduct::new("W-1", "Widget", Some(" ".into()), 1, 1, Some("".into())).unwrap();
        assert_eq!(p.description, None);
        assert_eq!(p.category_id, None);
    }

    #[test]
    fn replace_keeps_identity() {
        let id = ProductId::new();
        let created_at = Utc::now();
        let mut product = Product::create(id, widget(10, 5).unwrap(), created_at);

        product.replace(NewProduct::new("W-2", "Gadget", None, 7, 1, None).unwrap());

        assert_eq!(product.id, id);
        assert_eq!(product.created_at, created_at);
        assert_eq!(product.name, "Gadget");
        assert_eq!(product.stock_level.get(), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any non-negative price/stock with non-blank text is accepted unchanged.
            #[test]
            fn valid_numbers_survive_validation(
                price in 0i64..1_000_000,
                stock in 0i64..1_000_000,
                name in "[A-Za-z][A-Za-z0-9 ]{0,40}",
            ) {
                let p = NewProduct::new("SKU", name, None, price, stock, None).unwrap();
                prop_assert_eq!(p.price.minor(), price as u64);
                prop_assert_eq!(p.stock_level.get(), stock);
            }

            /// Property: negative stock is always rejected.
            #[test]
            fn negative_stock_is_rejected(stock in i64::MIN..0) {
                prop_assert!(NewProduct::new("SKU", "Name", None, 1, stock, None).is_err());
            }
        }
    }
}

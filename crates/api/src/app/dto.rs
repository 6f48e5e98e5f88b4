use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::Deserialize;

use stockcart_cart::CartView;
use stockcart_catalog::{NewProduct, Product};
use stockcart_core::CartResult;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

// Quantities arrive as plain integers; range checks happen in the domain so
// that a zero or negative value answers with a validation error body.

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    #[serde(alias = "productId")]
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    #[serde(alias = "stockLevel")]
    pub stock_level: i64,
    #[serde(default, alias = "categoryId")]
    pub category_id: Option<String>,
}

impl ProductRequest {
    pub fn into_new_product(self) -> CartResult<NewProduct> {
        NewProduct::new(
            self.sku,
            self.name,
            self.description,
            self.price,
            self.stock_level,
            self.category_id,
        )
    }
}

/// Unwrap a JSON body, answering 400 instead of axum's default rejection.
pub fn body<T>(payload: Result<axum::Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    payload
        .map(|axum::Json(v)| v)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()))
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn cart_to_json(view: CartView) -> serde_json::Value {
    serde_json::json!({
        "items": view.items.into_iter().map(|l| serde_json::json!({
            "id": l.id.to_string(),
            "product_id": l.product_id.to_string(),
            "product_name": l.product_name,
            "price": l.price.minor(),
            "quantity": l.quantity.get(),
            "subtotal": l.subtotal.minor(),
        })).collect::<Vec<_>>(),
        "total": view.total.minor(),
        "stale_items": view.stale_items.iter().map(|id| id.to_string()).collect::<Vec<_>>(),
    })
}

pub fn product_to_json(p: Product) -> serde_json::Value {
    serde_json::json!({
        "id": p.id.to_string(),
        "sku": p.sku,
        "name": p.name,
        "description": p.description,
        "price": p.price.minor(),
        "stock_level": p.stock_level.get(),
        "category_id": p.category_id,
        "created_at": p.created_at.to_rfc3339(),
    })
}

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};

use stockcart_core::{CartItemId, ProductId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(view_cart))
        .route("/add", post(add_to_cart))
        .route("/update/:id", put(update_quantity))
        .route("/remove/:id", delete(remove_from_cart))
}

pub async fn view_cart(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.ledger.view_cart().await {
        Ok(view) => Json(dto::cart_to_json(view)).into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn add_to_cart(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::AddToCartRequest>, JsonRejection>,
) -> axum::response::Response {
    let body = match dto::body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let product_id: ProductId = match errors::parse_id(&body.product_id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.coordinator.add_to_cart(product_id, body.quantity).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn update_quantity(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::UpdateQuantityRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: CartItemId = match errors::parse_id(&id, "cart item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let body = match dto::body(payload) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.coordinator.change_quantity(id, body.quantity).await {
        Ok(()) => Json(serde_json::json!({ "id": id.to_string(), "quantity": body.quantity }))
            .into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn remove_from_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CartItemId = match errors::parse_id(&id, "cart item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.coordinator.remove_from_cart(id).await {
        Ok(()) => Json(serde_json::json!({ "id": id.to_string(), "removed": true })).into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

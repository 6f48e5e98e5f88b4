use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockcart_core::ProductId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.catalog.list_products().await {
        Ok(products) => Json(serde_json::Value::Array(
            products.into_iter().map(dto::product_to_json).collect(),
        ))
        .into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.get_product(id).await {
        Ok(p) => Json(dto::product_to_json(p)).into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::ProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let fields = match dto::body(payload).map(dto::ProductRequest::into_new_product) {
        Ok(Ok(f)) => f,
        Ok(Err(e)) => return errors::cart_error_to_response(e),
        Err(resp) => return resp,
    };

    match services.catalog.create_product(fields).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::ProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let fields = match dto::body(payload).map(dto::ProductRequest::into_new_product) {
        Ok(Ok(f)) => f,
        Ok(Err(e)) => return errors::cart_error_to_response(e),
        Err(resp) => return resp,
    };

    match services.catalog.update_product(id, fields).await {
        Ok(()) => Json(serde_json::json!({ "id": id.to_string() })).into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.delete_product(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

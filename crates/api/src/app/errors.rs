use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockcart_core::CartError;

pub fn cart_error_to_response(err: CartError) -> axum::response::Response {
    match err {
        CartError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        CartError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({
                "error": "not_found",
                "message": format!("{entity} {id} not found"),
                "entity": entity,
                "id": id,
            })),
        )
            .into_response(),
        CartError::InsufficientStock {
            product_id,
            requested,
            available,
        } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": format!(
                    "insufficient stock for product {product_id}: requested {requested}, available {available}"
                ),
                "product_id": product_id.to_string(),
                "requested": requested,
                "available": available,
            })),
        )
            .into_response(),
        CartError::Persistence { message, retryable } => {
            // Backend detail stays in the log.
            tracing::error!(retryable, "persistence failure: {message}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(json!({
                    "error": "persistence_error",
                    "message": persistence_message(retryable),
                    "retryable": retryable,
                })),
            )
                .into_response()
        }
    }
}

fn persistence_message(retryable: bool) -> &'static str {
    if retryable {
        "storage temporarily unavailable; retry the request"
    } else {
        "storage rejected the operation"
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path id, answering 400 on malformed input.
pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}

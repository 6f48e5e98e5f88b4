use axum::Router;

pub mod cart;
pub mod products;
pub mod system;

/// Router for the cart and catalog endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/cart", cart::router())
        .nest("/products", products::router())
}

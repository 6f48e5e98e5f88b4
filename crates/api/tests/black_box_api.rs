use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use stockcart_api::app::services::AppServices;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over the in-memory store, bound to an ephemeral port.
        let services = AppServices::in_memory(Duration::from_secs(2));
        let app = stockcart_api::app::build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_product(
    client: &reqwest::Client,
    server: &TestServer,
    sku: &str,
    price: i64,
    stock: i64,
) -> String {
    let res = client
        .post(server.url("/products"))
        .json(&json!({
            "sku": sku,
            "name": format!("Product {sku}"),
            "price": price,
            "stockLevel": stock,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn stock_of(client: &reqwest::Client, server: &TestServer, id: &str) -> i64 {
    let res = client
        .get(server.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["stock_level"].as_i64().unwrap()
}

async fn add(
    client: &reqwest::Client,
    server: &TestServer,
    product_id: &str,
    quantity: i64,
) -> reqwest::Response {
    client
        .post(server.url("/cart/add"))
        .json(&json!({ "productId": product_id, "quantity": quantity }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn().await;
    let res = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn cart_view_reports_lines_and_total() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let a = create_product(&client, &server, "A-1", 10, 5).await;
    let b = create_product(&client, &server, "B-1", 5, 5).await;

    assert_eq!(add(&client, &server, &a, 2).await.status(), StatusCode::CREATED);
    assert_eq!(add(&client, &server, &b, 3).await.status(), StatusCode::CREATED);

    let res = client.get(server.url("/cart")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let view: serde_json::Value = res.json().await.unwrap();

    let items = view["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["product_id"], a);
    assert_eq!(items[0]["subtotal"], 20);
    assert_eq!(items[1]["subtotal"], 15);
    assert_eq!(view["total"], 35);
    assert!(view["stale_items"].as_array().unwrap().is_empty());

    assert_eq!(stock_of(&client, &server, &a).await, 3);
    assert_eq!(stock_of(&client, &server, &b).await, 2);
}

#[tokio::test]
async fn insufficient_stock_is_400_with_available() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let p = create_product(&client, &server, "SKU-5", 10, 5).await;
    assert_eq!(add(&client, &server, &p, 5).await.status(), StatusCode::CREATED);

    let res = add(&client, &server, &p, 1).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["available"], 0);
    assert_eq!(stock_of(&client, &server, &p).await, 0);
}

#[tokio::test]
async fn unknown_product_is_404_and_zero_quantity_is_400() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let missing = "0190a6a4-0000-7000-8000-000000000000";
    let res = add(&client, &server, missing, 1).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let p = create_product(&client, &server, "SKU-Z", 10, 5).await;
    let res = add(&client, &server, &p, 0).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(stock_of(&client, &server, &p).await, 5);
}

#[tokio::test]
async fn update_and_remove_move_stock() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let p = create_product(&client, &server, "SKU-U", 10, 10).await;
    let res = add(&client, &server, &p, 3).await;
    let body: serde_json::Value = res.json().await.unwrap();
    let item = body["id"].as_str().unwrap().to_string();

    let res = client
        .put(server.url(&format!("/cart/update/{item}")))
        .json(&json!({ "quantity": 6 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(stock_of(&client, &server, &p).await, 4);

    let res = client
        .put(server.url(&format!("/cart/update/{item}")))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stock_of(&client, &server, &p).await, 4);

    let res = client
        .delete(server.url(&format!("/cart/remove/{item}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(stock_of(&client, &server, &p).await, 10);

    let res = client
        .delete(server.url(&format!("/cart/remove/{item}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(stock_of(&client, &server, &p).await, 10);
}

#[tokio::test]
async fn product_crud_round_trip() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let p = create_product(&client, &server, "CRUD-1", 250, 7).await;

    let res = client
        .put(server.url(&format!("/products/{p}")))
        .json(&json!({
            "sku": "CRUD-1",
            "name": "Renamed",
            "description": "now with words",
            "price": 300,
            "stock_level": 9,
            "categoryId": "tools",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = client
        .get(server.url(&format!("/products/{p}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["price"], 300);
    assert_eq!(body["stock_level"], 9);
    assert_eq!(body["category_id"], "tools");

    let list: serde_json::Value = client
        .get(server.url("/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);

    let res = client
        .delete(server.url(&format!("/products/{p}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(server.url(&format!("/products/{p}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_product_payload_is_400() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/products"))
        .json(&json!({ "sku": "NEG", "name": "Negative", "price": -1, "stockLevel": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(server.url("/products"))
        .json(&json!({ "sku": "NOPRICE" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn malformed_ids_are_400() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/products/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .delete(server.url("/cart/remove/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = add(&client, &server, "nope", 1).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_adds_never_oversell() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let p = create_product(&client, &server, "RACE", 10, 5).await;

    let (r1, r2) = tokio::join!(add(&client, &server, &p, 3), add(&client, &server, &p, 3));
    let statuses = [r1.status(), r2.status()];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::BAD_REQUEST).count(), 1);
    assert_eq!(stock_of(&client, &server, &p).await, 2);
}

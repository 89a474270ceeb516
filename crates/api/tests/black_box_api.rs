use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use pawmart_api::config::Config;
use pawmart_auth::Claims;
use pawmart_core::UserId;
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Same router as prod, in-memory store, ephemeral port.
        let config = Config {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            bind_addr: String::new(),
        };
        let app = pawmart_api::app::build_app(&config)
            .await
            .expect("failed to build app");
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
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, user_id: UserId) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iat: now - 10,
        exp: now + 600,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_listing(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    price: i64,
    stock: i64,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/marketplace/listings", base_url))
        .bearer_auth(token)
        .json(&json!({
            "title": "Beagle puppy",
            "species": "dog",
            "breed": "Beagle",
            "price": price,
            "stock": stock,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;

    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/marketplace/orders", srv.base_url))
        .json(&json!({ "listing_id": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/marketplace/listings", srv.base_url))
        .json(&json!({ "title": "t", "species": "dog", "price": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn caller_identity_is_derived_from_token() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let user_id = UserId::new();
    let token = mint_jwt(jwt_secret, user_id);

    let res = reqwest::Client::new()
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user_id"].as_str().unwrap(), user_id.to_string());
}

#[tokio::test]
async fn listing_lifecycle_create_fetch_search() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, UserId::new());
    let client = reqwest::Client::new();

    let created = create_listing(&client, &srv.base_url, &token, 25_000, 3).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "available");
    assert_eq!(created["stock"], 3);

    // Public fetch, no token.
    let res = client
        .get(format!("{}/marketplace/listings/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched["title"], "Beagle puppy");
    assert_eq!(fetched["price"], 25_000);

    // Public search finds it by species; a different species does not.
    let res = client
        .get(format!(
            "{}/marketplace/listings?species=dog",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let res = client
        .get(format!(
            "{}/marketplace/listings?species=cat",
            srv.base_url
        ))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn placing_an_order_snapshots_total_and_decrements_stock() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let seller_token = mint_jwt(jwt_secret, UserId::new());
    let created = create_listing(&client, &srv.base_url, &seller_token, 100, 5).await;
    let listing_id = created["id"].as_str().unwrap().to_string();

    let buyer_token = mint_jwt(jwt_secret, UserId::new());
    let res = client
        .post(format!("{}/marketplace/orders", srv.base_url))
        .bearer_auth(&buyer_token)
        .json(&json!({ "listing_id": listing_id, "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: serde_json::Value = res.json().await.unwrap();
    assert_eq!(order["total_price"], 300);
    assert_eq!(order["quantity"], 3);
    assert_eq!(order["status"], "pending");

    let res = client
        .get(format!(
            "{}/marketplace/listings/{}",
            srv.base_url, listing_id
        ))
        .send()
        .await
        .unwrap();
    let listing: serde_json::Value = res.json().await.unwrap();
    assert_eq!(listing["stock"], 2);
    assert_eq!(listing["status"], "available");
}

#[tokio::test]
async fn buying_the_last_units_sells_the_listing_out() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let token = mint_jwt(jwt_secret, UserId::new());
    let created = create_listing(&client, &srv.base_url, &token, 4_500, 2).await;
    let listing_id = created["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/marketplace/orders", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "listing_id": listing_id, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!(
            "{}/marketplace/listings/{}",
            srv.base_url, listing_id
        ))
        .send()
        .await
        .unwrap();
    let listing: serde_json::Value = res.json().await.unwrap();
    assert_eq!(listing["stock"], 0);
    assert_eq!(listing["status"], "sold");

    // Sold listings drop out of search results.
    let res = client
        .get(format!("{}/marketplace/listings", srv.base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn overbuying_fails_and_leaves_stock_untouched() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let token = mint_jwt(jwt_secret, UserId::new());
    let created = create_listing(&client, &srv.base_url, &token, 8_000, 1).await;
    let listing_id = created["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/marketplace/orders", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "listing_id": listing_id, "quantity": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");

    let res = client
        .get(format!(
            "{}/marketplace/listings/{}",
            srv.base_url, listing_id
        ))
        .send()
        .await
        .unwrap();
    let listing: serde_json::Value = res.json().await.unwrap();
    assert_eq!(listing["stock"], 1);
}

#[tokio::test]
async fn ordering_a_missing_listing_is_not_found() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, UserId::new());

    let res = reqwest::Client::new()
        .post(format!("{}/marketplace/orders", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "listing_id": UserId::new().to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn explicit_zero_quantity_is_rejected() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let token = mint_jwt(jwt_secret, UserId::new());
    let created = create_listing(&client, &srv.base_url, &token, 500, 3).await;
    let listing_id = created["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/marketplace/orders", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "listing_id": listing_id, "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn order_history_is_scoped_to_the_buyer() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let seller_token = mint_jwt(jwt_secret, UserId::new());
    let created = create_listing(&client, &srv.base_url, &seller_token, 100, 5).await;
    let listing_id = created["id"].as_str().unwrap().to_string();

    let buyer_token = mint_jwt(jwt_secret, UserId::new());
    let other_token = mint_jwt(jwt_secret, UserId::new());

    let res = client
        .post(format!("{}/marketplace/orders", srv.base_url))
        .bearer_auth(&buyer_token)
        .json(&json!({ "listing_id": listing_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: serde_json::Value = res.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap().to_string();

    // The buyer sees their order.
    let res = client
        .get(format!("{}/marketplace/orders", srv.base_url))
        .bearer_auth(&buyer_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    // Another buyer sees neither the history entry nor the order itself.
    let res = client
        .get(format!("{}/marketplace/orders", srv.base_url))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["items"].as_array().unwrap().is_empty());

    let res = client
        .get(format!("{}/marketplace/orders/{}", srv.base_url, order_id))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/marketplace/orders/{}", srv.base_url, order_id))
        .bearer_auth(&buyer_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, UserId::new());
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/marketplace/listings/not-a-uuid", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/marketplace/orders", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "listing_id": "not-a-uuid" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

mod common;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;

use storefront::config::Config;
use storefront::http::{router, AppState};
use storefront::models::Role;
use storefront::payments::{PaymentGateway, PaymentIntent, PaymentIntentRequest};
use storefront::StoreResult;

use common::{bearer, seed_product, seed_user, setup_database, stock_of};

#[derive(Default)]
struct FakeGateway {
    requests: Mutex<Vec<PaymentIntentRequest>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> StoreResult<PaymentIntent> {
        self.requests.lock().push(request.clone());
        Ok(PaymentIntent {
            id: "pi_fake".to_string(),
            client_secret: "pi_fake_secret_123".to_string(),
        })
    }
}

fn app(pool: &PgPool, gateway: Arc<FakeGateway>) -> Router {
    router(AppState::new(pool.clone(), &Config::for_test(), gateway))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_health_and_auth_rejections() {
    let pool = setup_database().await;
    let app = app(&pool, Arc::new(FakeGateway::default()));

    let (status, _) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = send(&app, "GET", "/api/orders", Some("Bearer garbage"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let customer = seed_user(&pool, "ana@example.com", Role::Customer).await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/products",
        Some(&bearer(&customer)),
        Some(json!({"name": "Mug", "price": "12.99", "stock": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_register_login_and_profile() {
    let pool = setup_database().await;
    let app = app(&pool, Arc::new(FakeGateway::default()));

    let (status, body) = send(
        &app,
        "POST",
        "/api/users/register",
        None,
        Some(json!({
            "firstName": "Ana",
            "lastName": "Rojas",
            "email": "ana@example.com",
            "password": "s3cret-pass"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "customer");
    assert!(body.get("passwordHash").is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/api/users/login",
        None,
        Some(json!({"email": "ana@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid credentials");

    let (status, body) = send(
        &app,
        "POST",
        "/api/users/login",
        None,
        Some(json!({"email": "ana@example.com", "password": "s3cret-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = format!("Bearer {}", body["token"].as_str().unwrap());

    let (status, body) = send(
        &app,
        "PUT",
        "/api/users/me",
        Some(&token),
        Some(json!({"phone": "555-0100"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone"], "555-0100");
    assert_eq!(body["firstName"], "Ana");

    let (status, body) = send(&app, "GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ana@example.com");

    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_order_endpoints() {
    let pool = setup_database().await;
    let app = app(&pool, Arc::new(FakeGateway::default()));
    let ana = seed_user(&pool, "ana@example.com", Role::Customer).await;
    let ben = seed_user(&pool, "ben@example.com", Role::Customer).await;
    let admin = seed_user(&pool, "admin@example.com", Role::Admin).await;
    let mug = seed_product(&pool, "Mug", "12.99", 50).await;
    let lamp = seed_product(&pool, "Lamp", "40.00", 1).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&bearer(&ana)),
        Some(json!({"lines": [{"productId": mug.id, "quantity": 2, "unitPrice": 12.99}]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["lines"][0]["unitPrice"], "12.99");
    let order_id = body["order"]["id"].as_i64().unwrap();
    assert_eq!(stock_of(&pool, mug.id).await, 48);

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&bearer(&ana)),
        Some(json!({"lines": [{"productId": 9999, "quantity": 1, "unitPrice": "1.00"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "product 9999 not found");

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&bearer(&ben)),
        Some(json!({"lines": [{"productId": lamp.id, "quantity": 2, "unitPrice": "40.00"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().ends_with("available: 1"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/orders",
        Some(&bearer(&ana)),
        Some(json!({"lines": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for unit_price in ["12.999", "100000000"] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/orders",
            Some(&bearer(&ana)),
            Some(json!({"lines": [{"productId": mug.id, "quantity": 1, "unitPrice": unit_price}]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{unit_price}");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with(&format!("unit price for product {}", mug.id)));
    }
    assert_eq!(stock_of(&pool, mug.id).await, 48);

    let uri = format!("/api/orders/{order_id}");
    let (status, _) = send(&app, "GET", &uri, Some(&bearer(&ben)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", &uri, Some(&bearer(&admin)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lines"][0]["product"]["name"], "Mug");

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&bearer(&ana)),
        Some(json!({"status": "confirmed"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&bearer(&admin)),
        Some(json!({"status": "confirmed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");

    let (status, _) = send(&app, "PUT", &uri, Some(&bearer(&admin)), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/api/orders", Some(&bearer(&ben)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = send(&app, "GET", "/api/orders/not-a-number", Some(&bearer(&ana)), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_product_admin_and_dashboard() {
    let pool = setup_database().await;
    let app = app(&pool, Arc::new(FakeGateway::default()));
    let admin = seed_user(&pool, "admin@example.com", Role::Admin).await;
    let token = bearer(&admin);

    let (status, body) = send(
        &app,
        "POST",
        "/api/products",
        Some(&token),
        Some(json!({"name": "Mug", "price": "12.99", "stock": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let (status, body) = send(&app, "GET", &format!("/api/products/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], "12.99");

    let (status, _) = send(
        &app,
        "POST",
        "/api/products",
        Some(&token),
        Some(json!({"name": "Bad", "price": "-1", "stock": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for price in ["12.999", "100000000"] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/products",
            Some(&token),
            Some(json!({"name": "Bad", "price": price, "stock": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{price}");
        assert!(body["message"].as_str().unwrap().starts_with("price must"));

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/products/{id}"),
            Some(&token),
            Some(json!({"price": price})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{price}");
    }
    let (_, body) = send(&app, "GET", &format!("/api/products/{id}"), None, None).await;
    assert_eq!(body["price"], "12.99");

    let (status, body) = send(&app, "GET", "/api/admin/dashboard?year=2024", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["year"], 2024);
    assert_eq!(body["inventory"][0]["name"], "Mug");
    assert_eq!(body["monthlySales"], json!([]));

    let (status, _) = send(&app, "DELETE", &format!("/api/products/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/products/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
async fn test_payment_intent() {
    let pool = setup_database().await;
    let gateway = Arc::new(FakeGateway::default());
    let app = app(&pool, gateway.clone());
    let ana = seed_user(&pool, "ana@example.com", Role::Customer).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/payments/create-payment-intent",
        Some(&bearer(&ana)),
        Some(json!({"items": [{"price": 449.4, "quantity": 1}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("450"));
    assert!(gateway.requests.lock().is_empty());

    let (status, body) = send(
        &app,
        "POST",
        "/api/payments/create-payment-intent",
        Some(&bearer(&ana)),
        Some(json!({"items": [{"price": "1000", "quantity": 2}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clientSecret"], "pi_fake_secret_123");
    assert_eq!(gateway.requests.lock()[0].amount, 2000);
    assert_eq!(gateway.requests.lock()[0].user_id, ana.id);

    pool.close().await;
}

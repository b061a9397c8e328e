//! Database-backed tests.
//!
//! These tests require a `PostgreSQL` database in `TEST_DATABASE_URL`.
//! Run with: `cargo test -p bloom-integration-tests -- --ignored`

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use bloom_core::{OrderStatus, UserRole};
use bloom_integration_tests::{database_app, get, json, send, test_pool, unique_session};
use bloom_storefront::db::{
    CategoryRepository, CouponRepository, OrderRepository, ProductRepository, RepositoryError,
};
use bloom_storefront::models::{Category, CategoryInput, CouponInput, Product, ProductInput};
use bloom_storefront::services::auth::AuthService;
use rust_decimal::Decimal;
use serde_json::{Value, json as body};
use sqlx::PgPool;

fn unique(prefix: &str) -> String {
    format!("{prefix} {}", uuid::Uuid::new_v4().simple())
}

async fn create_category(pool: &PgPool) -> Category {
    CategoryRepository::new(pool)
        .create(&CategoryInput {
            name: unique("Roses"),
            icon: "rose".to_string(),
            color: "#e11d48".to_string(),
        })
        .await
        .unwrap()
}

async fn create_product(pool: &PgPool, category: Option<&Category>, price: Decimal) -> Product {
    ProductRepository::new(pool)
        .create(&ProductInput {
            name: unique("Bouquet"),
            price,
            description: String::new(),
            image: String::new(),
            category_id: category.map(|c| c.id),
            in_stock: true,
        })
        .await
        .unwrap()
}

async fn product_count(pool: &PgPool, category: &Category) -> i32 {
    CategoryRepository::new(pool)
        .get(category.id)
        .await
        .unwrap()
        .unwrap()
        .product_count
}

fn session_cookie(response_headers: &axum::http::HeaderMap) -> String {
    response_headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string()
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_category_product_count_follows_products() {
    let pool = test_pool().await;
    let roses = create_category(&pool).await;
    let tulips = create_category(&pool).await;

    let product = create_product(&pool, Some(&roses), Decimal::new(2500, 2)).await;
    assert_eq!(product_count(&pool, &roses).await, 1);

    let moved = ProductInput {
        name: product.name.clone(),
        price: product.price,
        description: String::new(),
        image: String::new(),
        category_id: Some(tulips.id),
        in_stock: true,
    };
    ProductRepository::new(&pool)
        .update(product.id, &moved)
        .await
        .unwrap();
    assert_eq!(product_count(&pool, &roses).await, 0);
    assert_eq!(product_count(&pool, &tulips).await, 1);

    ProductRepository::new(&pool).delete(product.id).await.unwrap();
    assert_eq!(product_count(&pool, &tulips).await, 0);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_category_with_products_cannot_be_deleted() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let product = create_product(&pool, Some(&category), Decimal::new(1500, 2)).await;

    let err = CategoryRepository::new(&pool)
        .delete(category.id)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    ProductRepository::new(&pool).delete(product.id).await.unwrap();
    CategoryRepository::new(&pool).delete(category.id).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_review_updates_product_rating() {
    let (app, pool) = database_app().await;
    let product = create_product(&pool, None, Decimal::new(3000, 2)).await;
    let path = format!("/api/products/{}/reviews", product.id);

    for rating in [5, 4] {
        let review = body!({ "authorName": "Ana", "rating": rating, "comment": "Lovely" });
        let (status, _) = send(&app, json("POST", &path, &review)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get(&format!("/api/products/{}", product.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reviewCount"], 2);
    assert_eq!(body["rating"], "4.5");

    let out_of_range = body!({ "authorName": "Ana", "rating": 6, "comment": "Wow" });
    let (status, _) = send(&app, json("POST", &path, &out_of_range)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Cart and checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_cart_to_whatsapp_order() {
    let (app, pool) = database_app().await;
    let product = create_product(&pool, None, Decimal::new(2500, 2)).await;
    let session = unique_session();

    let add = body!({ "sessionId": session, "productId": product.id, "quantity": 2 });
    let (status, cart) = send(&app, json("POST", "/api/cart", &add)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["itemCount"], 2);

    // Adding again merges into the same line.
    let (_, cart) = send(&app, json("POST", "/api/cart", &add)).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["itemCount"], 4);

    let quote = body!({ "deliveryMethod": "delivery" });
    let (status, quote) = send(
        &app,
        json("POST", &format!("/api/cart/{session}/quote"), &quote),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["totals"]["subtotal"], "100.00");
    assert_eq!(quote["totals"]["shipping"], "0.00");
    assert_eq!(quote["totals"]["discount"], "0.00");

    let order = body!({
        "customerName": "Ana",
        "customerPhone": "+1 555 0100",
        "deliveryMethod": "delivery",
        "deliveryAddress": "1 Garden Way",
        "sessionId": session,
    });
    let (status, placed) = send(&app, json("POST", "/api/orders", &order)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(placed["order"]["status"], "pending");
    assert!(
        placed["whatsappUrl"]
            .as_str()
            .unwrap()
            .starts_with("https://wa.me/15550102030?text=")
    );
    assert!(placed["message"].as_str().unwrap().contains("1 Garden Way"));

    let (_, cart) = send(&app, get(&format!("/api/cart/{session}"))).await;
    assert_eq!(cart["itemCount"], 0);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_order_applies_coupon_and_delivery_fee() {
    let (app, pool) = database_app().await;
    let product = create_product(&pool, None, Decimal::new(2000, 2)).await;
    let code = format!("T{}", uuid::Uuid::new_v4().simple()).to_uppercase();
    CouponRepository::new(&pool)
        .create(&CouponInput {
            code: code.clone(),
            discount: Decimal::new(10, 0),
            is_active: true,
            expires_at: None,
        })
        .await
        .unwrap();

    let path = format!("/api/coupons/{}", code.to_lowercase());
    let (status, coupon) = send(&app, get(&path)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(coupon["code"], Value::String(code.clone()));

    let order = body!({
        "customerName": "Ana",
        "customerPhone": "+1 555 0100",
        "deliveryMethod": "delivery",
        "deliveryAddress": "1 Garden Way",
        "couponCode": code,
        "items": [{ "productId": product.id, "quantity": 2 }],
    });
    let (status, placed) = send(&app, json("POST", "/api/orders", &order)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(placed["order"]["subtotal"], "40.00");
    assert_eq!(placed["order"]["discount"], "4.00");
    assert_eq!(placed["order"]["shippingCost"], "10.00");
    assert_eq!(placed["order"]["total"], "46.00");
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_order_lines_follow_the_cart_quantity_cap() {
    let (app, pool) = database_app().await;
    let product = create_product(&pool, None, Decimal::new(100, 2)).await;

    let order = body!({
        "customerName": "Ana",
        "customerPhone": "+1 555 0100",
        "deliveryMethod": "pickup",
        "items": [{ "productId": product.id, "quantity": 5000 }],
    });
    let (status, body) = send(&app, json("POST", "/api/orders", &order)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("between 1 and 99"));

    // Split lines are merged before the cap applies.
    let order = body!({
        "customerName": "Ana",
        "customerPhone": "+1 555 0100",
        "deliveryMethod": "pickup",
        "items": [
            { "productId": product.id, "quantity": 60 },
            { "productId": product.id, "quantity": 60 },
        ],
    });
    let (status, _) = send(&app, json("POST", "/api/orders", &order)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_order_total_beyond_storage_is_rejected() {
    let (app, pool) = database_app().await;
    let product = create_product(&pool, None, Decimal::new(9_999_999_999, 2)).await;

    let order = body!({
        "customerName": "Ana",
        "customerPhone": "+1 555 0100",
        "deliveryMethod": "pickup",
        "items": [{ "productId": product.id, "quantity": 2 }],
    });
    let (status, body) = send(&app, json("POST", "/api/orders", &order)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("exceeds the maximum"));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_order_with_explicit_items_keeps_the_cart() {
    let (app, pool) = database_app().await;
    let rose = create_product(&pool, None, Decimal::new(1500, 2)).await;
    let tulip = create_product(&pool, None, Decimal::new(900, 2)).await;
    let session = unique_session();

    let add = body!({ "sessionId": session, "productId": tulip.id, "quantity": 3 });
    let (status, _) = send(&app, json("POST", "/api/cart", &add)).await;
    assert_eq!(status, StatusCode::OK);

    let order = body!({
        "customerName": "Ana",
        "customerPhone": "+1 555 0100",
        "deliveryMethod": "pickup",
        "sessionId": session,
        "items": [{ "productId": rose.id, "quantity": 1 }],
    });
    let (status, placed) = send(&app, json("POST", "/api/orders", &order)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(placed["order"]["total"], "15.00");

    let (_, cart) = send(&app, get(&format!("/api/cart/{session}"))).await;
    assert_eq!(cart["itemCount"], 3);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_order_without_customer_details_lists_missing_fields() {
    let (app, _pool) = database_app().await;
    let order = body!({
        "deliveryMethod": "delivery",
        "items": [{ "productId": 1, "quantity": 1 }]
    });
    let (status, body) = send(&app, json("POST", "/api/orders", &order)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "missing required fields: customerName, customerPhone, deliveryAddress"
    );
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_finished_orders_keep_their_status() {
    let (app, pool) = database_app().await;
    let product = create_product(&pool, None, Decimal::new(1000, 2)).await;
    let order = body!({
        "customerName": "Ana",
        "customerPhone": "+1 555 0100",
        "items": [{ "productId": product.id, "quantity": 1 }],
    });
    let (_, placed) = send(&app, json("POST", "/api/orders", &order)).await;
    let id = placed["order"]["id"].as_i64().unwrap();
    let id = bloom_core::OrderId::new(i32::try_from(id).unwrap());

    let orders = OrderRepository::new(&pool);
    orders.update_status(id, OrderStatus::Confirmed).await.unwrap();
    orders.update_status(id, OrderStatus::Delivered).await.unwrap();

    let err = orders
        .update_status(id, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

// ============================================================================
// Auth and back-office
// ============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_customer_session_cannot_reach_admin() {
    let (app, _pool) = database_app().await;
    let email = format!("{}@example.com", uuid::Uuid::new_v4().simple());

    let register = body!({ "email": email, "name": "Ana", "password": "tulips-in-spring" });
    let request = json("POST", "/api/auth/register", &register);
    let response = tower::ServiceExt::oneshot(app.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(response.headers());

    let me = Request::get("/api/auth/me")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, user) = send(&app, me).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "customer");

    let admin = Request::get("/api/admin/orders")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, admin).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, json("POST", "/api/auth/register", &register)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_admin_reports_and_settings() {
    let (app, pool) = database_app().await;
    let email = format!("{}@example.com", uuid::Uuid::new_v4().simple());
    AuthService::new(&pool)
        .create_user(&email, "Owner", "peonies-all-year", UserRole::Admin)
        .await
        .unwrap();

    let login = body!({ "email": email, "password": "peonies-all-year" });
    let request = json("POST", "/api/auth/login", &login);
    let response = tower::ServiceExt::oneshot(app.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(response.headers());

    let report = Request::get("/api/admin/reports?days=7")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, report) = send(&app, report).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["days"], 7);

    let bad_window = Request::get("/api/admin/reports?days=0")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, bad_window).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let update = Request::put("/api/admin/settings")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body!({ "storeName": "  Bloom & Co  " }).to_string()))
        .unwrap();
    let (status, settings) = send(&app, update).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["storeName"], "Bloom & Co");
    assert_eq!(settings["deliveryFee"], "10.00");

    let (_, public) = send(&app, get("/api/settings")).await;
    assert_eq!(public["storeName"], "Bloom & Co");
    assert!(public.get("whatsappNumber").is_none());

    let negative_fee = Request::put("/api/admin/settings")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body!({ "deliveryFee": "-1" }).to_string()))
        .unwrap();
    let (status, _) = send(&app, negative_fee).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let category = create_category(&pool).await;
    let renamed = unique("Tulips");
    let rename = Request::put(format!("/api/admin/categories/{}", category.id))
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body!({ "name": renamed, "icon": "tulip" }).to_string()))
        .unwrap();
    let (status, updated) = send(&app, rename).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], Value::String(renamed));

    let pricey = Request::post("/api/admin/products")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            body!({ "name": "Orchid Wall", "price": "100000000" }).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, pricey).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "price must be below 100000000");
}

//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness check
//! GET    /health/ready                    - Readiness check (database)
//!
//! # Catalog
//! GET    /api/categories                  - Category listing
//! GET    /api/products                    - Product listing (?categoryId=&inStock=)
//! GET    /api/products/{id}               - Product detail
//! GET    /api/products/{id}/reviews       - Reviews, newest first
//! POST   /api/products/{id}/reviews       - Submit a review
//!
//! # Cart (anonymous, keyed by client session id)
//! GET    /api/cart/{sessionId}            - Cart contents
//! POST   /api/cart                        - Add a product
//! DELETE /api/cart/{sessionId}            - Empty the cart
//! PUT    /api/cart/items/{id}             - Set a line quantity
//! DELETE /api/cart/items/{id}             - Remove a line (?sessionId=)
//! POST   /api/cart/{sessionId}/quote      - Price the cart
//!
//! # Checkout
//! GET    /api/coupons/{code}              - Check a coupon
//! POST   /api/orders                      - Place an order, returns the WhatsApp link
//! GET    /api/settings                    - Public store settings
//! POST   /api/ai/chat                     - Florist assistant
//!
//! # Auth
//! POST   /api/auth/login
//! POST   /api/auth/register
//! POST   /api/auth/logout
//! GET    /api/auth/me
//!
//! # Back-office (admin role)
//! /api/admin/...                          - See `admin::routes`
//! ```

pub mod admin;
pub mod ai;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod coupons;
pub mod extract;
pub mod orders;
pub mod settings;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::middleware::rate_limit::RateLimiterLayer;
use crate::middleware::{ai_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::list_categories))
        .route("/products", get(catalog::list_products))
        .route("/products/{id}", get(catalog::get_product))
        .route(
            "/products/{id}/reviews",
            get(catalog::list_reviews).post(catalog::create_review),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(cart::add))
        .route("/{session_id}", get(cart::show).delete(cart::clear))
        .route("/{session_id}/quote", post(cart::quote))
        .route(
            "/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the auth routes router.
///
/// Login and registration go through `limiter` when one is given.
pub fn auth_routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    let mut credentials = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register));
    if let Some(limiter) = limiter {
        credentials = credentials.layer(limiter);
    }

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .merge(credentials)
}

/// Create the assistant routes router.
pub fn ai_routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    let router = Router::new().route("/chat", post(ai::chat));
    match limiter {
        Some(limiter) => router.layer(limiter),
        None => router,
    }
}

fn build(
    auth_limiter: Option<RateLimiterLayer>,
    ai_limiter: Option<RateLimiterLayer>,
) -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .route("/coupons/{code}", get(coupons::check))
        .route("/orders", post(orders::place))
        .route("/settings", get(settings::public))
        .nest("/ai", ai_routes(ai_limiter))
        .nest("/auth", auth_routes(auth_limiter))
        .nest("/admin", admin::routes());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api)
}

/// Create all routes without rate limiting.
///
/// The limiters key on the client IP, which in-process test requests don't
/// carry.
pub fn routes() -> Router<AppState> {
    build(None, None)
}

/// Create all routes with rate limiting on auth and the assistant.
///
/// The server must be run with `into_make_service_with_connect_info` so
/// requests without proxy headers still have a key.
pub fn rate_limited_routes() -> Router<AppState> {
    build(Some(auth_rate_limiter()), Some(ai_rate_limiter()))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

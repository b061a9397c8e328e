//! Back-office routes. Every handler takes `RequireAdmin`.

pub mod categories;
pub mod coupons;
pub mod orders;
pub mod products;
pub mod reports;
pub mod settings;

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

/// Routes nested under `/api/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/{id}",
            put(categories::update).delete(categories::delete),
        )
        .route("/coupons", get(coupons::list).post(coupons::create))
        .route("/coupons/{id}", put(coupons::update).delete(coupons::delete))
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::show).delete(orders::delete))
        .route("/orders/{id}/status", put(orders::update_status))
        .route("/settings", get(settings::show).put(settings::update))
        .route("/reports", get(reports::sales))
}

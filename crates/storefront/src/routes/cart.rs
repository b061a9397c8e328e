//! Cart routes.
//!
//! Carts are keyed by a client-generated session id. Line routes carry the
//! session id in the body (`PUT`) or query string (`DELETE`) so a line can
//! only be changed from its own session.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use bloom_core::{CartItemId, DeliveryMethod, ProductId};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::db::{CartRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::Cart;
use crate::models::cart::{MAX_LINE_QUANTITY, validate_session_id};
use crate::services::checkout::{CartQuote, CheckoutService};
use crate::state::AppState;

fn check_session(session_id: &str) -> Result<()> {
    validate_session_id(session_id).map_err(AppError::BadRequest)
}

fn check_quantity(quantity: u32) -> Result<()> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "quantity must be at most {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

const fn default_quantity() -> u32 {
    1
}

/// Body of `POST /api/cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub session_id: String,
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Body of `PUT /api/cart/items/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub session_id: String,
    pub quantity: u32,
}

/// Query of `DELETE /api/cart/items/{id}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub session_id: String,
}

/// Body of `POST /api/cart/{sessionId}/quote`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
}

/// GET /api/cart/{sessionId}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<String>,
) -> Result<Json<Cart>> {
    check_session(&session_id)?;
    let cart = CartRepository::new(state.pool()).get(&session_id).await?;
    Ok(Json(cart))
}

/// POST /api/cart
#[instrument(skip(state, body), fields(product_id = %body.product_id, quantity = body.quantity))]
pub async fn add(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<Json<Cart>> {
    check_session(&body.session_id)?;
    if body.quantity == 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_string()));
    }
    check_quantity(body.quantity)?;

    let cart = CartRepository::new(state.pool())
        .add(&body.session_id, body.product_id, body.quantity, MAX_LINE_QUANTITY)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound("Product not found".to_string())
            }
            other => other.into(),
        })?;
    Ok(Json(cart))
}

/// DELETE /api/cart/{sessionId}
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<String>,
) -> Result<Json<Cart>> {
    check_session(&session_id)?;
    let removed = CartRepository::new(state.pool()).clear(&session_id).await?;
    tracing::debug!(removed, "Cart cleared");
    Ok(Json(Cart::new(session_id, Vec::new())))
}

/// PUT /api/cart/items/{id}
#[instrument(skip(state, body), fields(quantity = body.quantity))]
pub async fn update_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CartItemId>,
    ApiJson(body): ApiJson<UpdateQuantityRequest>,
) -> Result<Json<Cart>> {
    check_session(&body.session_id)?;
    check_quantity(body.quantity)?;
    let cart = CartRepository::new(state.pool())
        .set_quantity(&body.session_id, id, body.quantity)
        .await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/items/{id}?sessionId=
#[instrument(skip(state, query))]
pub async fn remove_item(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CartItemId>,
    ApiQuery(query): ApiQuery<SessionQuery>,
) -> Result<Json<Cart>> {
    check_session(&query.session_id)?;
    let cart = CartRepository::new(state.pool())
        .remove(&query.session_id, id)
        .await?;
    Ok(Json(cart))
}

/// POST /api/cart/{sessionId}/quote
#[instrument(skip(state, body), fields(method = %body.delivery_method))]
pub async fn quote(
    State(state): State<AppState>,
    ApiPath(session_id): ApiPath<String>,
    ApiJson(body): ApiJson<QuoteRequest>,
) -> Result<Json<CartQuote>> {
    check_session(&session_id)?;
    let settings = state.store_settings().await?;
    let quote = CheckoutService::new(state.pool(), &settings)
        .quote_cart(&session_id, body.coupon_code.as_deref(), body.delivery_method)
        .await?;
    Ok(Json(quote))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_bounds() {
        assert!(check_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(check_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_add_request_defaults_quantity() {
        let body: AddToCartRequest =
            serde_json::from_str(r#"{"sessionId":"abc","productId":3}"#).unwrap();
        assert_eq!(body.quantity, 1);
    }

    #[test]
    fn test_quote_request_defaults_to_pickup() {
        let body: QuoteRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(body.delivery_method, DeliveryMethod::Pickup);
        assert!(body.coupon_code.is_none());
    }
}

//! Order placement.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use super::extract::ApiJson;
use crate::error::Result;
use crate::models::OrderRequest;
use crate::services::checkout::{CheckoutService, PlacedOrder};
use crate::state::AppState;

/// POST /api/orders
///
/// Responds with the stored order, the rendered WhatsApp message and the
/// `wa.me` link that opens it.
#[instrument(skip(state, request))]
pub async fn place(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let settings = state.store_settings().await?;
    let placed = CheckoutService::new(state.pool(), &settings)
        .place_order(&request)
        .await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

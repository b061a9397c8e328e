//! Public coupon lookup.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use super::extract::ApiPath;
use crate::error::{AppError, Result};
use crate::services::checkout::{CheckoutError, CheckoutService};
use crate::state::AppState;

/// What a shopper learns about a valid code.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponCheck {
    pub code: String,
    pub discount: Decimal,
}

/// GET /api/coupons/{code}
///
/// 404 for unknown codes; 400 for inactive or expired ones.
#[instrument(skip(state))]
pub async fn check(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
) -> Result<Json<CouponCheck>> {
    let settings = state.store_settings().await?;
    let coupon = CheckoutService::new(state.pool(), &settings)
        .redeemable_coupon(&code)
        .await
        .map_err(|e| match e {
            CheckoutError::UnknownCoupon(_) => AppError::NotFound("Coupon not found".to_string()),
            other => other.into(),
        })?;

    Ok(Json(CouponCheck {
        code: coupon.code,
        discount: coupon.discount,
    }))
}

//! Coupon management.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use bloom_core::CouponId;

use crate::db::CouponRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Coupon, CouponInput};
use crate::routes::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// GET /api/admin/coupons
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Coupon>>> {
    Ok(Json(CouponRepository::new(state.pool()).list().await?))
}

/// POST /api/admin/coupons
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<CouponInput>,
) -> Result<(StatusCode, Json<Coupon>)> {
    let input = input.normalized().map_err(AppError::BadRequest)?;
    let coupon = CouponRepository::new(state.pool()).create(&input).await?;
    tracing::info!(coupon_id = %coupon.id, code = %coupon.code, "Coupon created");
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// PUT /api/admin/coupons/{id}
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<CouponId>,
    ApiJson(input): ApiJson<CouponInput>,
) -> Result<Json<Coupon>> {
    let input = input.normalized().map_err(AppError::BadRequest)?;
    let coupon = CouponRepository::new(state.pool()).update(id, &input).await?;
    Ok(Json(coupon))
}

/// DELETE /api/admin/coupons/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<CouponId>,
) -> Result<StatusCode> {
    CouponRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

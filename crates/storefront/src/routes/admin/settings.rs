//! Store settings management.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::SettingsRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{StoreSettings, StoreSettingsUpdate};
use crate::routes::extract::ApiJson;
use crate::state::AppState;

/// GET /api/admin/settings
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<StoreSettings>> {
    Ok(Json(state.store_settings().await?))
}

/// PUT /api/admin/settings
///
/// Partial update; omitted fields keep their value.
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(update): ApiJson<StoreSettingsUpdate>,
) -> Result<Json<StoreSettings>> {
    let update = update.normalized().map_err(AppError::BadRequest)?;
    let settings = SettingsRepository::new(state.pool())
        .update_store_settings(&update, &state.config().store)
        .await?;
    tracing::info!("Store settings updated");
    Ok(Json(settings))
}

//! Public store settings.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::models::PublicSettings;
use crate::state::AppState;

/// GET /api/settings
#[instrument(skip(state))]
pub async fn public(State(state): State<AppState>) -> Result<Json<PublicSettings>> {
    let settings = state.store_settings().await?;
    Ok(Json(settings.into()))
}

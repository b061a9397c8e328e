//! Sales dashboard.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use crate::db::{ReportRepository, reports::SalesReport};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::routes::extract::ApiQuery;
use crate::state::AppState;

const DEFAULT_DAYS: i32 = 30;
const MAX_DAYS: i32 = 365;

/// Query of `GET /api/admin/reports`.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub days: Option<i32>,
}

impl ReportQuery {
    fn window(&self) -> Result<i32> {
        let days = self.days.unwrap_or(DEFAULT_DAYS);
        if !(1..=MAX_DAYS).contains(&days) {
            return Err(AppError::BadRequest(format!(
                "days must be between 1 and {MAX_DAYS}"
            )));
        }
        Ok(days)
    }
}

/// GET /api/admin/reports[?days=]
#[instrument(skip(state, _admin))]
pub async fn sales(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<Json<SalesReport>> {
    let days = query.window()?;
    Ok(Json(ReportRepository::new(state.pool()).sales(days).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_window() {
        assert_eq!(ReportQuery { days: None }.window().ok(), Some(DEFAULT_DAYS));
        assert_eq!(ReportQuery { days: Some(7) }.window().ok(), Some(7));
        assert!(ReportQuery { days: Some(0) }.window().is_err());
        assert!(ReportQuery { days: Some(MAX_DAYS + 1) }.window().is_err());
    }
}

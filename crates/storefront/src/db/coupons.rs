//! Coupon repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use bloom_core::CouponId;

use super::RepositoryError;
use crate::models::{Coupon, CouponInput};

const DUPLICATE_CODE: &str = "a coupon with this code already exists";

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: CouponId,
    code: String,
    discount: Decimal,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            discount: row.discount,
            is_active: row.is_active,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all coupons, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let rows = sqlx::query_as::<_, CouponRow>(
            r"
            SELECT id, code, discount, is_active, expires_at, created_at
            FROM shop.coupons
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Coupon::from).collect())
    }

    /// Look up a coupon by its normalized code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(
            r"
            SELECT id, code, discount, is_active, expires_at, created_at
            FROM shop.coupons
            WHERE code = $1
            ",
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Coupon::from))
    }

    /// Create a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create(&self, input: &CouponInput) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(
            r"
            INSERT INTO shop.coupons (code, discount, is_active, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, code, discount, is_active, expires_at, created_at
            ",
        )
        .bind(&input.code)
        .bind(input.discount)
        .bind(input.is_active)
        .bind(input.expires_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, DUPLICATE_CODE))?;

        Ok(row.into())
    }

    /// Replace a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new code is taken.
    #[instrument(skip(self, input), fields(coupon_id = %id))]
    pub async fn update(&self, id: CouponId, input: &CouponInput) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(
            r"
            UPDATE shop.coupons
            SET code = $2, discount = $3, is_active = $4, expires_at = $5
            WHERE id = $1
            RETURNING id, code, discount, is_active, expires_at, created_at
            ",
        )
        .bind(id)
        .bind(&input.code)
        .bind(input.discount)
        .bind(input.is_active)
        .bind(input.expires_at)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, DUPLICATE_CODE))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a coupon. Orders keep the code they were placed with.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon doesn't exist.
    #[instrument(skip(self), fields(coupon_id = %id))]
    pub async fn delete(&self, id: CouponId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.coupons WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

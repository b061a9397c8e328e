//! Review repository.
//!
//! Posting a review recomputes the product's `rating` and `review_count` in
//! the same transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use bloom_core::{ProductId, ReviewId};

use super::RepositoryError;
use crate::models::{Review, ReviewInput};

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_id: ProductId,
    author_name: String,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            author_name: row.author_name,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a product's reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r"
            SELECT id, product_id, author_name, rating, comment, created_at
            FROM shop.reviews
            WHERE product_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Insert a review and refresh the product's rating aggregate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    #[instrument(skip(self, input), fields(product_id = %product_id, rating = input.rating))]
    pub async fn create(
        &self,
        product_id: ProductId,
        input: &ReviewInput,
    ) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock the product so concurrent reviews aggregate in order.
        sqlx::query_scalar::<_, ProductId>("SELECT id FROM shop.products WHERE id = $1 FOR UPDATE")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO shop.reviews (product_id, author_name, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, product_id, author_name, rating, comment, created_at
            ",
        )
        .bind(product_id)
        .bind(&input.author_name)
        .bind(input.rating)
        .bind(&input.comment)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE shop.products
            SET rating = COALESCE(
                    (SELECT ROUND(AVG(rating)::numeric, 1) FROM shop.reviews WHERE product_id = $1),
                    0
                ),
                review_count = (SELECT COUNT(*)::int FROM shop.reviews WHERE product_id = $1),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}

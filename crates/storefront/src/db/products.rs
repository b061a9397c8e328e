//! Product repository.
//!
//! Product writes run in a transaction that locks the affected categories,
//! writes the product, then recounts each category's `product_count`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use bloom_core::{CategoryId, ProductId};

use super::RepositoryError;
use super::categories::{lock_categories, recount_products};
use crate::models::{Product, ProductFilter, ProductInput};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    price: Decimal,
    description: String,
    image: String,
    category_id: Option<CategoryId>,
    rating: Decimal,
    review_count: i32,
    in_stock: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            description: row.description,
            image: row.image,
            category_id: row.category_id,
            rating: row.rating,
            review_count: row.review_count,
            in_stock: row.in_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, newest first, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, description, image, category_id,
                   rating, review_count, in_stock, created_at, updated_at
            FROM shop.products
            WHERE ($1::int IS NULL OR category_id = $1)
              AND ($2::bool IS NULL OR in_stock = $2)
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(filter.category_id)
        .bind(filter.in_stock)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, description, image, category_id,
                   rating, review_count, in_stock, created_at, updated_at
            FROM shop.products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Get several products at once. Missing IDs are simply absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, description, image, category_id,
                   rating, review_count, in_stock, created_at, updated_at
            FROM shop.products
            WHERE id = ANY($1)
            ",
        )
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Create a product and recount its category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(category_id) = input.category_id {
            let found = lock_categories(&mut *tx, &[category_id]).await?;
            if found.is_empty() {
                return Err(unknown_category(category_id));
            }
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO shop.products (name, price, description, image, category_id, in_stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, price, description, image, category_id,
                      rating, review_count, in_stock, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.category_id)
        .bind(input.in_stock)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(category_id) = row.category_id {
            recount_products(&mut *tx, category_id).await?;
        }

        tx.commit().await?;
        Ok(row.into())
    }

    /// Replace a product's fields and recount the old and new categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new category doesn't exist.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<CategoryId> = sqlx::query_scalar::<_, Option<CategoryId>>(
            "SELECT category_id FROM shop.products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let mut affected: Vec<CategoryId> = previous.into_iter().chain(input.category_id).collect();
        affected.sort_unstable();
        affected.dedup();
        let found = lock_categories(&mut *tx, &affected).await?;
        if let Some(category_id) = input.category_id
            && !found.contains(&category_id)
        {
            return Err(unknown_category(category_id));
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE shop.products
            SET name = $2, price = $3, description = $4, image = $5,
                category_id = $6, in_stock = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, price, description, image, category_id,
                      rating, review_count, in_stock, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.price)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.category_id)
        .bind(input.in_stock)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        for category_id in found {
            recount_products(&mut *tx, category_id).await?;
        }

        tx.commit().await?;
        Ok(row.into())
    }

    /// Delete a product and recount its category.
    ///
    /// Cart lines and reviews for the product are removed by cascade; placed
    /// orders keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let category_id: Option<CategoryId> = sqlx::query_scalar::<_, Option<CategoryId>>(
            "SELECT category_id FROM shop.products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if let Some(category_id) = category_id {
            lock_categories(&mut *tx, &[category_id]).await?;
        }

        sqlx::query("DELETE FROM shop.products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if let Some(category_id) = category_id {
            recount_products(&mut *tx, category_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn unknown_category(id: CategoryId) -> RepositoryError {
    RepositoryError::Conflict(format!("category {id} does not exist"))
}

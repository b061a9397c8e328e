//! Category repository.
//!
//! `product_count` is owned by the product writes: every insert, update or
//! delete of a product recounts the affected categories in the same
//! transaction (see [`recount_products`]).

use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use bloom_core::CategoryId;

use super::RepositoryError;
use crate::models::{Category, CategoryInput};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    icon: String,
    color: String,
    product_count: i32,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            icon: row.icon,
            color: row.color,
            product_count: row.product_count,
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, icon, color, product_count
            FROM shop.categories
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, icon, color, product_count
            FROM shop.categories
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Create a category. New categories start with no products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.categories (name, icon, color)
            VALUES ($1, $2, $3)
            RETURNING id, name, icon, color, product_count
            ",
        )
        .bind(&input.name)
        .bind(&input.icon)
        .bind(&input.color)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "a category with this name already exists"))?;

        Ok(row.into())
    }

    /// Replace a category's name, icon and color.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    #[instrument(skip(self, input), fields(category_id = %id))]
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE shop.categories
            SET name = $2, icon = $3, color = $4
            WHERE id = $1
            RETURNING id, name, icon, color, product_count
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.icon)
        .bind(&input.color)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "a category with this name already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete an empty category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if products still reference it.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_count: i32 = sqlx::query_scalar(
            r"
            SELECT product_count FROM shop.categories
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if product_count > 0 {
            return Err(RepositoryError::Conflict(format!(
                "category still has {product_count} product(s); move or delete them first"
            )));
        }

        sqlx::query("DELETE FROM shop.categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Lock category rows for a product write, in ID order.
///
/// Returns the IDs that exist. Holding the row locks until commit serializes
/// concurrent product writes per category, so the recount that follows sees
/// every committed product.
pub(crate) async fn lock_categories(
    conn: &mut PgConnection,
    ids: &[CategoryId],
) -> Result<Vec<CategoryId>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<i32> = ids.iter().map(CategoryId::as_i32).collect();
    sqlx::query_scalar(
        r"
        SELECT id FROM shop.categories
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        ",
    )
    .bind(raw)
    .fetch_all(conn)
    .await
}

/// Set `product_count` to the live number of products in the category.
pub(crate) async fn recount_products(
    conn: &mut PgConnection,
    id: CategoryId,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        UPDATE shop.categories
        SET product_count = (
            SELECT COUNT(*)::int FROM shop.products WHERE category_id = $1
        )
        WHERE id = $1
        ",
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

//! Cart repository.
//!
//! Carts belong to an anonymous, client-generated session id. Line operations
//! are always scoped by that id so one session cannot edit another's cart.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use bloom_core::{CartItemId, ProductId};

use super::RepositoryError;
use crate::models::{Cart, CartLine};

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: CartItemId,
    product_id: ProductId,
    quantity: i32,
    name: String,
    price: Decimal,
    image: String,
    in_stock: bool,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "cart item {} has quantity {}",
                row.id, row.quantity
            ))
        })?;

        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            quantity,
            name: row.name,
            price: row.price,
            image: row.image,
            in_stock: row.in_stock,
            line_total: row.price * Decimal::from(quantity),
        })
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a session's cart (empty if it has no lines).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, session_id: &str) -> Result<Cart, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_cart(&mut *conn, session_id).await
    }

    /// Add a product, merging with an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if it is out of stock or the line
    /// would exceed `max_quantity`.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(
        &self,
        session_id: &str,
        product_id: ProductId,
        quantity: u32,
        max_quantity: u32,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let in_stock: bool =
            sqlx::query_scalar("SELECT in_stock FROM shop.products WHERE id = $1")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;
        if !in_stock {
            return Err(RepositoryError::Conflict(
                "product is out of stock".to_owned(),
            ));
        }

        let merged: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.cart_items (session_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_id, product_id)
            DO UPDATE SET quantity = shop.cart_items.quantity + EXCLUDED.quantity
            RETURNING quantity
            ",
        )
        .bind(session_id)
        .bind(product_id)
        .bind(to_db_quantity(quantity)?)
        .fetch_one(&mut *tx)
        .await?;

        if merged > to_db_quantity(max_quantity)? {
            return Err(RepositoryError::Conflict(format!(
                "at most {max_quantity} of a product per order"
            )));
        }

        let cart = load_cart(&mut *tx, session_id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist in this
    /// session's cart.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn set_quantity(
        &self,
        session_id: &str,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<Cart, RepositoryError> {
        if quantity == 0 {
            return self.remove(session_id, item_id).await;
        }

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r"
            UPDATE shop.cart_items
            SET quantity = $3
            WHERE id = $1 AND session_id = $2
            ",
        )
        .bind(item_id)
        .bind(session_id)
        .bind(to_db_quantity(quantity)?)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let cart = load_cart(&mut *tx, session_id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist in this
    /// session's cart.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove(
        &self,
        session_id: &str,
        item_id: CartItemId,
    ) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM shop.cart_items WHERE id = $1 AND session_id = $2")
            .bind(item_id)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let cart = load_cart(&mut *tx, session_id).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Empty a session's cart. Returns the number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn clear(&self, session_id: &str) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(clear_cart(&mut *conn, session_id).await?)
    }
}

/// Load all lines of a cart with their products.
pub(crate) async fn load_cart(
    conn: &mut PgConnection,
    session_id: &str,
) -> Result<Cart, RepositoryError> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r"
        SELECT c.id, c.product_id, c.quantity,
               p.name, p.price, p.image, p.in_stock
        FROM shop.cart_items c
        JOIN shop.products p ON p.id = c.product_id
        WHERE c.session_id = $1
        ORDER BY c.created_at, c.id
        ",
    )
    .bind(session_id)
    .fetch_all(conn)
    .await?;

    let items = rows
        .into_iter()
        .map(CartLine::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Cart::new(session_id.to_owned(), items))
}

/// Delete every line of a cart.
pub(crate) async fn clear_cart(
    conn: &mut PgConnection,
    session_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM shop.cart_items WHERE session_id = $1")
        .bind(session_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

fn to_db_quantity(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::Conflict(format!("quantity {quantity} is too large")))
}

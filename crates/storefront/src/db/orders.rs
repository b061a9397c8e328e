//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use bloom_core::{DeliveryMethod, OrderId, OrderStatus};

use super::RepositoryError;
use super::cart::clear_cart;
use crate::models::{NewOrder, Order, OrderLine};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    customer_name: String,
    customer_phone: String,
    customer_email: Option<String>,
    delivery_method: String,
    delivery_address: Option<String>,
    notes: Option<String>,
    items: Json<Vec<OrderLine>>,
    subtotal: Decimal,
    discount: Decimal,
    shipping_cost: Decimal,
    total: Decimal,
    coupon_code: Option<String>,
    status: String,
    session_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let delivery_method = row
            .delivery_method
            .parse::<DeliveryMethod>()
            .map_err(RepositoryError::DataCorruption)?;
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            customer_email: row.customer_email,
            delivery_method,
            delivery_address: row.delivery_address,
            notes: row.notes,
            items: row.items.0,
            subtotal: row.subtotal,
            discount: row.discount,
            shipping_cost: row.shipping_cost,
            total: row.total,
            coupon_code: row.coupon_code,
            status,
            session_id: row.session_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending order and, when asked, clear its cart session in the
    /// same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, order), fields(lines = order.items.len(), total = %order.totals.total))]
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO shop.orders (
                customer_name, customer_phone, customer_email,
                delivery_method, delivery_address, notes, items,
                subtotal, discount, shipping_cost, total,
                coupon_code, status, session_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, customer_name, customer_phone, customer_email,
                      delivery_method, delivery_address, notes, items,
                      subtotal, discount, shipping_cost, total,
                      coupon_code, status, session_id, created_at, updated_at
            ",
        )
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(order.customer_email.as_deref())
        .bind(order.delivery_method.as_str())
        .bind(order.delivery_address.as_deref())
        .bind(order.notes.as_deref())
        .bind(Json(&order.items))
        .bind(order.totals.subtotal)
        .bind(order.totals.discount)
        .bind(order.totals.shipping)
        .bind(order.totals.total)
        .bind(order.coupon_code.as_deref())
        .bind(OrderStatus::Pending.as_str())
        .bind(order.session_id.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        if let Some(session_id) = order.session_id.as_deref().filter(|_| order.clear_cart) {
            clear_cart(&mut *tx, session_id).await?;
        }

        tx.commit().await?;
        row.try_into()
    }

    /// List orders, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is unknown.
    #[instrument(skip(self))]
    pub async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_name, customer_phone, customer_email,
                   delivery_method, delivery_address, notes, items,
                   subtotal, discount, shipping_cost, total,
                   coupon_code, status, session_id, created_at, updated_at
            FROM shop.orders
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(status.map(OrderStatus::as_str))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_name, customer_phone, customer_email,
                   delivery_method, delivery_address, notes, items,
                   subtotal, discount, shipping_cost, total,
                   coupon_code, status, session_id, created_at, updated_at
            FROM shop.orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if the order is delivered or
    /// cancelled and `next` differs.
    #[instrument(skip(self), fields(order_id = %id, next = %next))]
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: String =
            sqlx::query_scalar("SELECT status FROM shop.orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;
        let current = current
            .parse::<OrderStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        if !current.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "order is {current} and can no longer change status"
            )));
        }

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE shop.orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, customer_name, customer_phone, customer_email,
                      delivery_method, delivery_address, notes, items,
                      subtotal, discount, shipping_cost, total,
                      coupon_code, status, session_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(next.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

//! Dashboard aggregation queries.
//!
//! Revenue figures exclude cancelled orders. Top products are computed from
//! the order line snapshots, so they survive product deletion.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use bloom_core::{OrderStatus, ProductId};

use super::RepositoryError;

/// How many products the report ranks.
const TOP_PRODUCTS: i64 = 5;

/// Sales and catalog summary for a window of days ending now.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub days: i32,
    pub total_orders: i64,
    pub revenue: Decimal,
    pub average_order_value: Decimal,
    pub orders_by_status: Vec<StatusCount>,
    pub top_products: Vec<TopProduct>,
    pub daily_revenue: Vec<DailyRevenue>,
    pub catalog: CatalogCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub day: NaiveDate,
    pub orders: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCounts {
    pub products: i64,
    pub in_stock_products: i64,
    pub categories: i64,
    pub active_coupons: i64,
}

#[derive(sqlx::FromRow)]
struct TotalsRow {
    total_orders: i64,
    revenue: Decimal,
    paid_orders: i64,
}

/// Average of `revenue` over `orders`, to cents. Zero when there are none.
#[must_use]
pub fn average_order_value(revenue: Decimal, orders: i64) -> Decimal {
    if orders <= 0 {
        return Decimal::ZERO;
    }
    (revenue / Decimal::from(orders)).round_dp(2)
}

/// Repository for report queries.
pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Build the sales report for the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is unknown.
    #[instrument(skip(self))]
    pub async fn sales(&self, days: i32) -> Result<SalesReport, RepositoryError> {
        let totals = sqlx::query_as::<_, TotalsRow>(
            r"
            SELECT COUNT(*) AS total_orders,
                   COALESCE(SUM(total) FILTER (WHERE status <> 'cancelled'), 0) AS revenue,
                   COUNT(*) FILTER (WHERE status <> 'cancelled') AS paid_orders
            FROM shop.orders
            WHERE created_at >= NOW() - make_interval(days => $1)
            ",
        )
        .bind(days)
        .fetch_one(self.pool)
        .await?;

        let status_rows = sqlx::query_as::<_, (String, i64)>(
            r"
            SELECT status, COUNT(*)
            FROM shop.orders
            WHERE created_at >= NOW() - make_interval(days => $1)
            GROUP BY status
            ",
        )
        .bind(days)
        .fetch_all(self.pool)
        .await?;

        let mut orders_by_status = status_rows
            .into_iter()
            .map(|(status, count)| {
                let status = status
                    .parse::<OrderStatus>()
                    .map_err(RepositoryError::DataCorruption)?;
                Ok(StatusCount { status, count })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        orders_by_status.sort_by_key(|entry| {
            OrderStatus::ALL.iter().position(|s| *s == entry.status)
        });

        let top_products = sqlx::query_as::<_, TopProduct>(
            r"
            SELECT (line->>'productId')::int AS product_id,
                   MAX(line->>'name') AS name,
                   SUM((line->>'quantity')::bigint)::bigint AS quantity,
                   SUM((line->>'lineTotal')::numeric) AS revenue
            FROM shop.orders o
            CROSS JOIN LATERAL jsonb_array_elements(o.items) AS line
            WHERE o.status <> 'cancelled'
              AND o.created_at >= NOW() - make_interval(days => $1)
            GROUP BY 1
            ORDER BY quantity DESC, revenue DESC
            LIMIT $2
            ",
        )
        .bind(days)
        .bind(TOP_PRODUCTS)
        .fetch_all(self.pool)
        .await?;

        let daily_revenue = sqlx::query_as::<_, DailyRevenue>(
            r"
            SELECT date_trunc('day', created_at)::date AS day,
                   COUNT(*) AS orders,
                   COALESCE(SUM(total), 0) AS revenue
            FROM shop.orders
            WHERE status <> 'cancelled'
              AND created_at >= NOW() - make_interval(days => $1)
            GROUP BY 1
            ORDER BY 1
            ",
        )
        .bind(days)
        .fetch_all(self.pool)
        .await?;

        let catalog = sqlx::query_as::<_, CatalogCounts>(
            r"
            SELECT (SELECT COUNT(*) FROM shop.products) AS products,
                   (SELECT COUNT(*) FROM shop.products WHERE in_stock) AS in_stock_products,
                   (SELECT COUNT(*) FROM shop.categories) AS categories,
                   (SELECT COUNT(*) FROM shop.coupons
                     WHERE is_active AND (expires_at IS NULL OR expires_at > NOW())) AS active_coupons
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(SalesReport {
            days,
            total_orders: totals.total_orders,
            revenue: totals.revenue,
            average_order_value: average_order_value(totals.revenue, totals.paid_orders),
            orders_by_status,
            top_products,
            daily_revenue,
            catalog,
        })
    }
}

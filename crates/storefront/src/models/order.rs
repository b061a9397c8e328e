//! Orders placed through WhatsApp checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bloom_core::{DeliveryMethod, OrderId, OrderStatus, PriceBreakdown, ProductId};

/// One ordered line, snapshotted at checkout.
///
/// Stored in `shop.orders.items` as JSON so later catalog edits do not
/// rewrite order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_method: DeliveryMethod,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderLine>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub coupon_code: Option<String>,
    pub status: OrderStatus,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to insert an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_method: DeliveryMethod,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderLine>,
    pub totals: PriceBreakdown,
    pub coupon_code: Option<String>,
    /// Cart session the order was placed from.
    pub session_id: Option<String>,
    /// Empty the session cart in the same transaction as the insert. Set only
    /// when the ordered lines were read from that cart.
    pub clear_cart: bool,
}

/// One requested line in an order body.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /api/orders`.
///
/// Prices are never taken from the client. When `items` is absent the
/// session cart is ordered and then emptied; explicit `items` leave the
/// cart untouched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    pub customer_email: Option<String>,
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub items: Option<Vec<OrderItemRequest>>,
    pub coupon_code: Option<String>,
    pub session_id: Option<String>,
}

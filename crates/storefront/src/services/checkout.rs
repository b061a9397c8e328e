//! WhatsApp checkout.
//!
//! Placing an order re-prices the requested lines from the catalog, applies
//! the coupon, stores the order and composes the message the shopper sends
//! to the store over WhatsApp.

use std::collections::HashMap;

use askama::Template;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bloom_core::{
    CurrencyCode, DeliveryMethod, LineItem, OrderId, PriceBreakdown, PricingError, ProductId,
    Price, pricing,
};

use crate::db::{
    CartRepository, CouponRepository, OrderRepository, ProductRepository, RepositoryError,
};
use crate::models::{
    Cart, Coupon, CouponRejection, NewOrder, Order, OrderItemRequest, OrderLine, OrderRequest,
    StoreSettings,
    cart::{MAX_LINE_QUANTITY, validate_session_id},
    normalize_code,
};

const WHATSAPP_BASE_URL: &str = "https://wa.me/";

/// Errors from pricing or placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Required customer fields are blank.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid session id: {0}")]
    InvalidSession(String),

    #[error("order has no items")]
    EmptyOrder,

    #[error("quantity for product {0} must be between 1 and {max}", max = MAX_LINE_QUANTITY)]
    InvalidQuantity(ProductId),

    #[error("product {0} does not exist")]
    UnknownProduct(ProductId),

    #[error("{0} is out of stock")]
    OutOfStock(String),

    #[error("coupon {0} does not exist")]
    UnknownCoupon(String),

    #[error("coupon {code}: {reason}")]
    CouponRejected {
        code: String,
        reason: CouponRejection,
    },

    #[error("pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// The store WhatsApp number has no digits.
    #[error("store WhatsApp number is not configured")]
    NoWhatsappNumber,

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CheckoutError {
    /// Whether the shopper can fix this by changing the request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::NoWhatsappNumber | Self::Template(_) | Self::Repository(_)
        )
    }
}

/// Customer fields after trimming; blank optionals become `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub delivery_method: DeliveryMethod,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
}

impl CustomerDetails {
    /// Validate the customer fields of an order request.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::MissingFields` naming every blank required
    /// field. The address is required only for home delivery.
    pub fn from_request(request: &OrderRequest) -> Result<Self, CheckoutError> {
        let name = request.customer_name.trim().to_string();
        let phone = request.customer_phone.trim().to_string();
        let delivery_address = non_blank(request.delivery_address.as_deref());

        let mut missing = Vec::new();
        if name.is_empty() {
            missing.push("customerName");
        }
        if phone.is_empty() {
            missing.push("customerPhone");
        }
        if request.delivery_method == DeliveryMethod::Delivery && delivery_address.is_none() {
            missing.push("deliveryAddress");
        }
        if !missing.is_empty() {
            return Err(CheckoutError::MissingFields(missing));
        }

        Ok(Self {
            name,
            phone,
            email: non_blank(request.customer_email.as_deref()),
            delivery_method: request.delivery_method,
            // Pickup orders don't carry an address.
            delivery_address: match request.delivery_method {
                DeliveryMethod::Delivery => delivery_address,
                DeliveryMethod::Pickup => None,
            },
            notes: non_blank(request.notes.as_deref()),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Priced cart returned by the quote endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuote {
    #[serde(flatten)]
    pub cart: Cart,
    pub delivery_method: DeliveryMethod,
    pub coupon: Option<Coupon>,
    pub totals: PriceBreakdown,
}

/// A stored order with its WhatsApp hand-off.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order: Order,
    pub message: String,
    pub whatsapp_url: String,
}

struct MessageLine<'a> {
    quantity: u32,
    name: &'a str,
    unit_price: String,
    total: String,
}

#[derive(Template)]
#[template(path = "checkout/order_message.txt")]
struct OrderMessageTemplate<'a> {
    store_name: &'a str,
    order_id: OrderId,
    customer_name: &'a str,
    customer_phone: &'a str,
    customer_email: Option<&'a str>,
    delivery_label: &'static str,
    delivery_address: Option<&'a str>,
    lines: Vec<MessageLine<'a>>,
    subtotal: String,
    discount: Option<String>,
    coupon_code: Option<&'a str>,
    shipping: String,
    total: String,
    notes: Option<&'a str>,
}

/// Render the order summary sent over WhatsApp.
///
/// # Errors
///
/// Returns `CheckoutError::Template` if rendering fails.
pub fn render_message(
    order: &Order,
    store_name: &str,
    currency: CurrencyCode,
) -> Result<String, CheckoutError> {
    let money = |amount: Decimal| Price::new(amount, currency).display();

    let template = OrderMessageTemplate {
        store_name,
        order_id: order.id,
        customer_name: &order.customer_name,
        customer_phone: &order.customer_phone,
        customer_email: order.customer_email.as_deref(),
        delivery_label: order.delivery_method.label(),
        delivery_address: order.delivery_address.as_deref(),
        lines: order
            .items
            .iter()
            .map(|line| MessageLine {
                quantity: line.quantity,
                name: &line.name,
                unit_price: money(line.unit_price),
                total: money(line.line_total),
            })
            .collect(),
        subtotal: money(order.subtotal),
        discount: (!order.discount.is_zero()).then(|| money(-order.discount)),
        coupon_code: order.coupon_code.as_deref(),
        shipping: if order.shipping_cost.is_zero() {
            "Free".to_string()
        } else {
            money(order.shipping_cost)
        },
        total: money(order.total),
        notes: order.notes.as_deref(),
    };

    Ok(template.render()?.trim().to_string())
}

/// Build a `wa.me` deep link that opens a chat with `text` prefilled.
///
/// # Errors
///
/// Returns `CheckoutError::NoWhatsappNumber` if `number` has no digits.
pub fn whatsapp_url(number: &str, text: &str) -> Result<String, CheckoutError> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(CheckoutError::NoWhatsappNumber);
    }
    Ok(format!(
        "{WHATSAPP_BASE_URL}{digits}?text={}",
        urlencoding::encode(text)
    ))
}

/// Sum quantities of repeated products, keeping first-seen order.
///
/// Each merged line must hold between 1 and `MAX_LINE_QUANTITY` units.
fn merge_items(items: &[OrderItemRequest]) -> Result<Vec<OrderItemRequest>, CheckoutError> {
    let mut merged: Vec<OrderItemRequest> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            return Err(CheckoutError::InvalidQuantity(item.product_id));
        }
        match merged.iter_mut().find(|m| m.product_id == item.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => merged.push(*item),
        }
    }
    if let Some(line) = merged.iter().find(|m| m.quantity > MAX_LINE_QUANTITY) {
        return Err(CheckoutError::InvalidQuantity(line.product_id));
    }
    Ok(merged)
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    settings: &'a StoreSettings,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, settings: &'a StoreSettings) -> Self {
        Self { pool, settings }
    }

    /// Look up a coupon and check it can be used now.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCoupon` or `CouponRejected` when it can't be applied.
    pub async fn redeemable_coupon(&self, code: &str) -> Result<Coupon, CheckoutError> {
        let code = normalize_code(code);
        let coupon = CouponRepository::new(self.pool)
            .get_by_code(&code)
            .await?
            .ok_or_else(|| CheckoutError::UnknownCoupon(code.clone()))?;
        coupon
            .check_redeemable(Utc::now())
            .map_err(|reason| CheckoutError::CouponRejected { code, reason })?;
        Ok(coupon)
    }

    async fn optional_coupon(&self, code: Option<&str>) -> Result<Option<Coupon>, CheckoutError> {
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => Ok(Some(self.redeemable_coupon(code).await?)),
            None => Ok(None),
        }
    }

    /// Price a session's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the coupon can't be applied or the cart can't be
    /// loaded.
    #[instrument(skip(self))]
    pub async fn quote_cart(
        &self,
        session_id: &str,
        coupon_code: Option<&str>,
        delivery_method: DeliveryMethod,
    ) -> Result<CartQuote, CheckoutError> {
        let cart = CartRepository::new(self.pool).get(session_id).await?;
        let coupon = self.optional_coupon(coupon_code).await?;

        let lines: Vec<LineItem> = cart.items.iter().map(|line| line.line_item()).collect();
        let totals = pricing::quote(
            &lines,
            coupon.as_ref().map(|c| c.discount),
            delivery_method,
            &self.settings.pricing_policy(),
        )?;

        Ok(CartQuote {
            cart,
            delivery_method,
            coupon,
            totals,
        })
    }

    /// Validate, price and store an order, then compose its WhatsApp message.
    ///
    /// # Errors
    ///
    /// Returns a client error for missing fields, unknown or out-of-stock
    /// products, an empty order or an unusable coupon.
    #[instrument(skip(self, request), fields(method = %request.delivery_method))]
    pub async fn place_order(&self, request: &OrderRequest) -> Result<PlacedOrder, CheckoutError> {
        let customer = CustomerDetails::from_request(request)?;

        let session_id = non_blank(request.session_id.as_deref());
        if let Some(session_id) = &session_id {
            validate_session_id(session_id).map_err(CheckoutError::InvalidSession)?;
        }

        let (requested, from_cart) = match (&request.items, &session_id) {
            (Some(items), _) if !items.is_empty() => (merge_items(items)?, false),
            (_, Some(session_id)) => {
                let cart = CartRepository::new(self.pool).get(session_id).await?;
                let items = cart
                    .items
                    .iter()
                    .map(|line| OrderItemRequest {
                        product_id: line.product_id,
                        quantity: line.quantity,
                    })
                    .collect();
                (items, true)
            }
            _ => (Vec::new(), false),
        };
        if requested.is_empty() {
            return Err(CheckoutError::EmptyOrder);
        }

        let ids: Vec<ProductId> = requested.iter().map(|item| item.product_id).collect();
        let products: HashMap<ProductId, _> = ProductRepository::new(self.pool)
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        let mut lines = Vec::with_capacity(requested.len());
        for item in &requested {
            let product = products
                .get(&item.product_id)
                .ok_or(CheckoutError::UnknownProduct(item.product_id))?;
            if !product.in_stock {
                return Err(CheckoutError::OutOfStock(product.name.clone()));
            }
            let line = LineItem::new(product.price, item.quantity);
            lines.push(OrderLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.price,
                quantity: item.quantity,
                line_total: line.line_total(),
            });
        }

        let coupon = self.optional_coupon(request.coupon_code.as_deref()).await?;

        let items: Vec<LineItem> = lines
            .iter()
            .map(|line| LineItem::new(line.unit_price, line.quantity))
            .collect();
        let totals = pricing::quote(
            &items,
            coupon.as_ref().map(|c| c.discount),
            customer.delivery_method,
            &self.settings.pricing_policy(),
        )?;

        let new_order = NewOrder {
            customer_name: customer.name,
            customer_phone: customer.phone,
            customer_email: customer.email,
            delivery_method: customer.delivery_method,
            delivery_address: customer.delivery_address,
            notes: customer.notes,
            items: lines,
            totals,
            coupon_code: coupon.map(|c| c.code),
            session_id,
            clear_cart: from_cart,
        };

        let order = OrderRepository::new(self.pool).create(&new_order).await?;
        tracing::info!(order_id = %order.id, total = %order.total, "Order placed");

        let message = render_message(&order, &self.settings.store_name, self.settings.currency)?;
        let whatsapp_url = whatsapp_url(&self.settings.whatsapp_number, &message)?;

        Ok(PlacedOrder {
            order,
            message,
            whatsapp_url,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bloom_core::OrderStatus;

    use super::*;

    fn request(method: DeliveryMethod) -> OrderRequest {
        OrderRequest {
            customer_name: "Ana Lima".to_string(),
            customer_phone: "+55 11 91234-5678".to_string(),
            customer_email: Some("  ".to_string()),
            delivery_method: method,
            delivery_address: Some("Rua das Flores 12".to_string()),
            notes: None,
            items: None,
            coupon_code: None,
            session_id: None,
        }
    }

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(42),
            customer_name: "Ana Lima".to_string(),
            customer_phone: "+55 11 91234-5678".to_string(),
            customer_email: None,
            delivery_method: DeliveryMethod::Delivery,
            delivery_address: Some("Rua das Flores 12".to_string()),
            notes: Some("Ring twice".to_string()),
            items: vec![OrderLine {
                product_id: ProductId::new(1),
                name: "Red Roses".to_string(),
                unit_price: Decimal::new(2500, 2),
                quantity: 2,
                line_total: Decimal::new(5000, 2),
            }],
            subtotal: Decimal::new(5000, 2),
            discount: Decimal::new(500, 2),
            shipping_cost: Decimal::new(1000, 2),
            total: Decimal::new(5500, 2),
            coupon_code: Some("SPRING10".to_string()),
            status: OrderStatus::Pending,
            session_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_missing_fields_are_all_listed() {
        let mut req = request(DeliveryMethod::Delivery);
        req.customer_name = " ".to_string();
        req.customer_phone = String::new();
        req.delivery_address = None;

        let err = CustomerDetails::from_request(&req).unwrap_err();
        match err {
            CheckoutError::MissingFields(fields) => {
                assert_eq!(fields, vec!["customerName", "customerPhone", "deliveryAddress"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pickup_does_not_need_an_address() {
        let mut req = request(DeliveryMethod::Pickup);
        req.delivery_address = None;
        let details = CustomerDetails::from_request(&req).unwrap();
        assert_eq!(details.delivery_address, None);
        assert_eq!(details.email, None);
    }

    #[test]
    fn test_message_contains_order_details() {
        let message = render_message(&order(), "Bloom Florist", CurrencyCode::USD).unwrap();

        assert!(message.starts_with("*New order #42* from Bloom Florist"));
        assert!(message.contains("Name: Ana Lima"));
        assert!(message.contains("Method: Home delivery"));
        assert!(message.contains("Address: Rua das Flores 12"));
        assert!(message.contains("- 2 x Red Roses @ $25.00 = $50.00"));
        assert!(message.contains("Discount (SPRING10): -$5.00"));
        assert!(message.contains("Shipping: $10.00"));
        assert!(message.contains("*Total: $55.00*"));
        assert!(message.contains("Notes: Ring twice"));
        assert!(!message.contains("Email:"));
    }

    #[test]
    fn test_message_shows_free_shipping() {
        let mut order = order();
        order.shipping_cost = Decimal::ZERO;
        order.discount = Decimal::ZERO;
        let message = render_message(&order, "Bloom", CurrencyCode::EUR).unwrap();
        assert!(message.contains("Shipping: Free"));
        assert!(!message.contains("Discount"));
    }

    #[test]
    fn test_whatsapp_url_encodes_text_and_strips_number() {
        let url = whatsapp_url("+1 (555) 010-2030", "Hi there & thanks\nBye").unwrap();
        assert_eq!(
            url,
            "https://wa.me/15550102030?text=Hi%20there%20%26%20thanks%0ABye"
        );
    }

    #[test]
    fn test_whatsapp_url_requires_digits() {
        assert!(matches!(
            whatsapp_url("n/a", "text"),
            Err(CheckoutError::NoWhatsappNumber)
        ));
    }

    #[test]
    fn test_merge_items_sums_duplicates() {
        let items = [
            OrderItemRequest { product_id: ProductId::new(1), quantity: 2 },
            OrderItemRequest { product_id: ProductId::new(2), quantity: 1 },
            OrderItemRequest { product_id: ProductId::new(1), quantity: 3 },
        ];
        let merged = merge_items(&items).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].quantity, 5);
    }

    #[test]
    fn test_merge_items_caps_merged_quantity() {
        let at_cap = [OrderItemRequest {
            product_id: ProductId::new(4),
            quantity: MAX_LINE_QUANTITY,
        }];
        assert!(merge_items(&at_cap).is_ok());

        let over = [OrderItemRequest { product_id: ProductId::new(4), quantity: 5000 }];
        assert!(matches!(
            merge_items(&over),
            Err(CheckoutError::InvalidQuantity(id)) if id == ProductId::new(4)
        ));

        // Two lines under the cap can merge past it.
        let split = [
            OrderItemRequest { product_id: ProductId::new(5), quantity: 60 },
            OrderItemRequest { product_id: ProductId::new(5), quantity: 60 },
        ];
        let err = merge_items(&split).unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "quantity for product 5 must be between 1 and 99");
    }

    #[test]
    fn test_merge_items_rejects_zero_quantity() {
        let items = [OrderItemRequest { product_id: ProductId::new(3), quantity: 0 }];
        assert!(matches!(
            merge_items(&items),
            Err(CheckoutError::InvalidQuantity(id)) if id == ProductId::new(3)
        ));
    }
}

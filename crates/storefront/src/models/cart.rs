//! Server-side cart for anonymous sessions.

use rust_decimal::Decimal;
use serde::Serialize;

use bloom_core::{CartItemId, LineItem, ProductId};

/// A cart line joined with its product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub in_stock: bool,
    pub line_total: Decimal,
}

impl CartLine {
    /// Pricing input for this line.
    #[must_use]
    pub const fn line_item(&self) -> LineItem {
        LineItem::new(self.price, self.quantity)
    }
}

/// A session's cart with summary figures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub session_id: String,
    pub items: Vec<CartLine>,
    /// Sum of quantities.
    pub item_count: u32,
    pub subtotal: Decimal,
}

impl Cart {
    /// Build a cart and its summary from lines.
    #[must_use]
    pub fn new(session_id: String, items: Vec<CartLine>) -> Self {
        let item_count = items.iter().map(|line| line.quantity).sum();
        let subtotal = items.iter().map(|line| line.line_total).sum();
        Self {
            session_id,
            items,
            item_count,
            subtotal,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Most units of one product a cart or order line can hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Validate a client-generated cart session id.
///
/// # Errors
///
/// Returns a message unless the id is 1-128 characters of `[A-Za-z0-9_-]`.
pub fn validate_session_id(session_id: &str) -> Result<(), String> {
    let valid_chars = session_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if session_id.is_empty() || session_id.len() > 128 || !valid_chars {
        return Err("sessionId must be 1-128 characters of letters, digits, '-' or '_'".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, price: Decimal, quantity: u32) -> CartLine {
        CartLine {
            id: CartItemId::new(id),
            product_id: ProductId::new(id),
            quantity,
            name: format!("Bouquet {id}"),
            price,
            image: String::new(),
            in_stock: true,
            line_total: price * Decimal::from(quantity),
        }
    }

    #[test]
    fn test_cart_summary() {
        let cart = Cart::new(
            "abc".to_string(),
            vec![line(1, Decimal::new(4500, 2), 2), line(2, Decimal::new(1250, 2), 1)],
        );
        assert_eq!(cart.item_count, 3);
        assert_eq!(cart.subtotal, Decimal::new(10_250, 2));
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_empty_cart_summary() {
        let cart = Cart::new("abc".to_string(), Vec::new());
        assert_eq!(cart.item_count, 0);
        assert_eq!(cart.subtotal, Decimal::ZERO);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_validate_session_id() {
        assert!(validate_session_id("session_1718-abc").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("has space").is_err());
        assert!(validate_session_id(&"a".repeat(129)).is_err());
    }
}

//! Cart and order pricing.
//!
//! One function, [`quote`], turns cart lines plus an optional coupon into the
//! four figures shown at checkout and stored on an order:
//!
//! - `subtotal` = Σ unit price × quantity
//! - `discount` = subtotal × percent / 100, rounded to cents
//! - `shipping` = 0 for pickup, or when the subtotal reaches the free-delivery
//!   threshold, otherwise the flat delivery fee
//! - `total` = subtotal − discount + shipping
//!
//! The discount never exceeds the subtotal, so a total is never negative.
//! Every figure carries two decimal places, zeros included.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::DeliveryMethod;

/// Largest amount a stored money column holds (`NUMERIC(10,2)`).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x540B_E3FF, 2, 0, false, 2);

const ZERO_CENTS: Decimal = Decimal::from_parts(0, 0, 0, false, 2);

/// Errors returned by [`quote`] and [`validate_discount_percent`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// A line has a quantity of zero.
    #[error("line {index} has a quantity of zero")]
    ZeroQuantity {
        /// Position of the offending line.
        index: usize,
    },
    /// A line has a negative unit price.
    #[error("line {index} has a negative unit price")]
    NegativePrice {
        /// Position of the offending line.
        index: usize,
    },
    /// Coupon percentage outside `(0, 100]`.
    #[error("discount must be greater than 0 and at most 100 percent, got {0}")]
    InvalidDiscount(Decimal),
    /// Subtotal or total above [`MAX_AMOUNT`].
    #[error("order amount {0} exceeds the maximum of {max}", max = MAX_AMOUNT)]
    AmountTooLarge(Decimal),
}

/// Store delivery rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPolicy {
    /// Flat fee charged for home delivery.
    pub delivery_fee: Decimal,
    /// Subtotal at or above which delivery is free.
    pub free_delivery_threshold: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            delivery_fee: Decimal::new(1000, 2),
            free_delivery_threshold: Decimal::new(10_000, 2),
        }
    }
}

impl PricingPolicy {
    /// Shipping charged for a delivery method at a given subtotal.
    #[must_use]
    pub fn shipping_for(&self, method: DeliveryMethod, subtotal: Decimal) -> Decimal {
        match method {
            DeliveryMethod::Pickup => ZERO_CENTS,
            DeliveryMethod::Delivery if subtotal >= self.free_delivery_threshold => ZERO_CENTS,
            DeliveryMethod::Delivery => cents(self.delivery_fee),
        }
    }
}

fn cents(amount: Decimal) -> Decimal {
    let mut amount = amount;
    amount.rescale(2);
    amount
}

/// A priced cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LineItem {
    #[must_use]
    pub const fn new(unit_price: Decimal, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    /// Unit price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The computed figures for a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

/// Check a coupon percentage.
///
/// # Errors
///
/// Returns [`PricingError::InvalidDiscount`] unless `0 < percent <= 100`.
pub fn validate_discount_percent(percent: Decimal) -> Result<Decimal, PricingError> {
    if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(PricingError::InvalidDiscount(percent));
    }
    Ok(percent)
}

/// Price a set of lines.
///
/// # Errors
///
/// Returns an error if a line has a zero quantity or a negative price, if
/// the coupon percentage is outside `(0, 100]`, or if the subtotal or total
/// exceeds [`MAX_AMOUNT`].
pub fn quote(
    lines: &[LineItem],
    discount_percent: Option<Decimal>,
    method: DeliveryMethod,
    policy: &PricingPolicy,
) -> Result<PriceBreakdown, PricingError> {
    let mut subtotal = ZERO_CENTS;
    for (index, line) in lines.iter().enumerate() {
        if line.quantity == 0 {
            return Err(PricingError::ZeroQuantity { index });
        }
        if line.unit_price.is_sign_negative() && !line.unit_price.is_zero() {
            return Err(PricingError::NegativePrice { index });
        }
        subtotal += line.line_total();
    }
    let subtotal = cents(subtotal);

    let discount = match discount_percent {
        Some(percent) => {
            let percent = validate_discount_percent(percent)?;
            (subtotal * percent / Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                .min(subtotal)
        }
        None => ZERO_CENTS,
    };

    let shipping = policy.shipping_for(method, subtotal);
    let total = subtotal - discount + shipping;

    if let Some(amount) = [subtotal, total].into_iter().find(|a| *a > MAX_AMOUNT) {
        return Err(PricingError::AmountTooLarge(amount));
    }

    Ok(PriceBreakdown {
        subtotal,
        discount,
        shipping,
        total,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn policy() -> PricingPolicy {
        PricingPolicy {
            delivery_fee: dec("10.00"),
            free_delivery_threshold: dec("100.00"),
        }
    }

    #[test]
    fn test_subtotal_sums_lines() {
        let lines = [
            LineItem::new(dec("45.00"), 2),
            LineItem::new(dec("12.50"), 1),
        ];
        let q = quote(&lines, None, DeliveryMethod::Pickup, &policy()).unwrap();
        assert_eq!(q.subtotal, dec("102.50"));
        assert_eq!(q.discount, Decimal::ZERO);
        assert_eq!(q.total, dec("102.50"));
    }

    #[test]
    fn test_discount_is_percent_of_subtotal() {
        let lines = [LineItem::new(dec("40.00"), 2)];
        for (percent, expected) in [("10", "8.00"), ("25", "20.00"), ("100", "80.00")] {
            let q = quote(&lines, Some(dec(percent)), DeliveryMethod::Pickup, &policy()).unwrap();
            assert_eq!(q.discount, dec(expected), "{percent}%");
        }
    }

    #[test]
    fn test_discount_rounds_to_cents() {
        let lines = [LineItem::new(dec("33.33"), 1)];
        let q = quote(&lines, Some(dec("15")), DeliveryMethod::Pickup, &policy()).unwrap();
        // 4.9995 -> 5.00
        assert_eq!(q.discount, dec("5.00"));
        assert_eq!(q.total, dec("28.33"));
    }

    #[test]
    fn test_delivery_fee_below_threshold() {
        let lines = [LineItem::new(dec("99.99"), 1)];
        let q = quote(&lines, None, DeliveryMethod::Delivery, &policy()).unwrap();
        assert_eq!(q.shipping, dec("10.00"));
        assert_eq!(q.total, dec("109.99"));
    }

    #[test]
    fn test_delivery_free_at_threshold() {
        let lines = [LineItem::new(dec("50.00"), 2)];
        let q = quote(&lines, None, DeliveryMethod::Delivery, &policy()).unwrap();
        assert_eq!(q.shipping, Decimal::ZERO);
    }

    #[test]
    fn test_threshold_uses_subtotal_before_discount() {
        let lines = [LineItem::new(dec("120.00"), 1)];
        let q = quote(&lines, Some(dec("50")), DeliveryMethod::Delivery, &policy()).unwrap();
        assert_eq!(q.shipping, Decimal::ZERO);
        assert_eq!(q.total, dec("60.00"));
    }

    #[test]
    fn test_pickup_is_always_free() {
        for price in ["1.00", "99.99", "500.00"] {
            let lines = [LineItem::new(dec(price), 1)];
            let q = quote(&lines, None, DeliveryMethod::Pickup, &policy()).unwrap();
            assert_eq!(q.shipping, Decimal::ZERO);
        }
    }

    #[test]
    fn test_total_identity_holds() {
        let lines = [
            LineItem::new(dec("19.90"), 3),
            LineItem::new(dec("7.25"), 4),
        ];
        for method in [DeliveryMethod::Pickup, DeliveryMethod::Delivery] {
            for percent in [None, Some(dec("5")), Some(dec("12.5"))] {
                let q = quote(&lines, percent, method, &policy()).unwrap();
                assert_eq!(q.total, q.subtotal - q.discount + q.shipping);
                assert!(q.total >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn test_empty_cart() {
        let q = quote(&[], Some(dec("10")), DeliveryMethod::Delivery, &policy()).unwrap();
        assert_eq!(q.subtotal, Decimal::ZERO);
        assert_eq!(q.discount, Decimal::ZERO);
        assert_eq!(q.shipping, dec("10.00"));
    }

    #[test]
    fn test_rejects_bad_lines() {
        let zero = [LineItem::new(dec("5.00"), 1), LineItem::new(dec("5.00"), 0)];
        assert_eq!(
            quote(&zero, None, DeliveryMethod::Pickup, &policy()),
            Err(PricingError::ZeroQuantity { index: 1 })
        );

        let negative = [LineItem::new(dec("-5.00"), 1)];
        assert_eq!(
            quote(&negative, None, DeliveryMethod::Pickup, &policy()),
            Err(PricingError::NegativePrice { index: 0 })
        );
    }

    #[test]
    fn test_rejects_out_of_range_discount() {
        let lines = [LineItem::new(dec("10.00"), 1)];
        assert!(quote(&lines, Some(dec("0")), DeliveryMethod::Pickup, &policy()).is_err());
        assert!(quote(&lines, Some(dec("100.01")), DeliveryMethod::Pickup, &policy()).is_err());
        assert!(validate_discount_percent(dec("100")).is_ok());
    }

    #[test]
    fn test_rejects_amounts_beyond_storage() {
        assert_eq!(MAX_AMOUNT, dec("99999999.99"));

        let at_limit = [LineItem::new(dec("99999999.99"), 1)];
        assert!(quote(&at_limit, None, DeliveryMethod::Pickup, &policy()).is_ok());

        let over = [LineItem::new(dec("100.00"), 2_000_000)];
        assert_eq!(
            quote(&over, None, DeliveryMethod::Pickup, &policy()),
            Err(PricingError::AmountTooLarge(dec("200000000.00")))
        );

        // Shipping alone can push the total over.
        let edge = [LineItem::new(dec("99999999.99"), 1)];
        let costly = PricingPolicy {
            delivery_fee: dec("10.00"),
            free_delivery_threshold: dec("100000000.00"),
        };
        assert!(matches!(
            quote(&edge, None, DeliveryMethod::Delivery, &costly),
            Err(PricingError::AmountTooLarge(_))
        ));
    }

    #[test]
    fn test_zero_figures_keep_two_decimals() {
        let lines = [LineItem::new(dec("60.00"), 2)];
        let q = quote(&lines, None, DeliveryMethod::Delivery, &policy()).unwrap();
        assert_eq!(q.shipping.to_string(), "0.00");
        assert_eq!(q.discount.to_string(), "0.00");

        let q = quote(&[LineItem::new(dec("5"), 1)], None, DeliveryMethod::Pickup, &policy())
            .unwrap();
        assert_eq!(q.subtotal.to_string(), "5.00");
        assert_eq!(q.total.to_string(), "5.00");

        let empty = quote(&[], None, DeliveryMethod::Pickup, &policy()).unwrap();
        let json = serde_json::to_value(empty).unwrap();
        assert_eq!(json["subtotal"], "0.00");
        assert_eq!(json["shipping"], "0.00");
    }

    #[test]
    fn test_breakdown_serializes_camel_case() {
        let json = serde_json::to_value(PriceBreakdown::default()).unwrap();
        assert!(json.get("subtotal").is_some());
        assert!(json.get("shipping").is_some());
    }
}

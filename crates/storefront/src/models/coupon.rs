//! Discount coupons.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bloom_core::CouponId;
use bloom_core::pricing::validate_discount_percent;

/// A percentage discount code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: CouponId,
    /// Upper-cased code.
    pub code: String,
    /// Percentage off the subtotal, in `(0, 100]`.
    pub discount: Decimal,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Why a coupon cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CouponRejection {
    #[error("coupon is not active")]
    Inactive,
    #[error("coupon has expired")]
    Expired,
}

impl Coupon {
    /// Check that the coupon can be applied at `now`.
    ///
    /// # Errors
    ///
    /// Returns the reason the coupon is unusable.
    pub fn check_redeemable(&self, now: DateTime<Utc>) -> Result<(), CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if self.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(CouponRejection::Expired);
        }
        Ok(())
    }
}

/// Canonical form of a coupon code: trimmed and upper-cased.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Body for creating or replacing a coupon.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponInput {
    pub code: String,
    pub discount: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

const fn default_active() -> bool {
    true
}

impl CouponInput {
    /// Normalize the code and check the discount.
    ///
    /// # Errors
    ///
    /// Returns every problem found, joined into one message.
    pub fn normalized(self) -> Result<Self, String> {
        let mut problems = Vec::new();
        let code = normalize_code(&self.code);
        if code.is_empty() {
            problems.push("code is required".to_string());
        } else if code.chars().any(char::is_whitespace) {
            problems.push("code cannot contain spaces".to_string());
        }
        if let Err(e) = validate_discount_percent(self.discount) {
            problems.push(e.to_string());
        }
        if !problems.is_empty() {
            return Err(problems.join("; "));
        }

        Ok(Self { code, ..self })
    }
}

//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bloom_core::{CategoryId, MAX_AMOUNT, ProductId};

/// A product category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Icon name or emoji shown by the client.
    pub icon: String,
    /// CSS color used for the category badge.
    pub color: String,
    /// Number of products in this category.
    pub product_count: i32,
}

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub description: String,
    /// Image URL.
    pub image: String,
    pub category_id: Option<CategoryId>,
    /// Average review rating, one decimal place.
    pub rating: Decimal,
    pub review_count: i32,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing products.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub in_stock: Option<bool>,
}

/// Body for creating or replacing a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
}

impl CategoryInput {
    /// Trim fields and check the name.
    ///
    /// # Errors
    ///
    /// Returns a message when the name is blank.
    pub fn normalized(self) -> Result<Self, String> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err("name is required".to_string());
        }
        Ok(Self {
            name,
            icon: self.icon.trim().to_string(),
            color: self.color.trim().to_string(),
        })
    }
}

/// Body for creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub category_id: Option<CategoryId>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}

impl ProductInput {
    /// Trim fields and check the name and price.
    ///
    /// # Errors
    ///
    /// Returns every problem found, joined into one message.
    pub fn normalized(self) -> Result<Self, String> {
        let mut problems = Vec::new();
        let name = self.name.trim().to_string();
        if name.is_empty() {
            problems.push("name is required");
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            problems.push("price must not be negative");
        }
        if self.price > MAX_AMOUNT {
            problems.push("price must be below 100000000");
        }
        if self.price.scale() > 2 && self.price != self.price.round_dp(2) {
            problems.push("price must have at most two decimal places");
        }
        if !problems.is_empty() {
            return Err(problems.join("; "));
        }

        Ok(Self {
            name,
            price: self.price,
            description: self.description.trim().to_string(),
            image: self.image.trim().to_string(),
            category_id: self.category_id,
            in_stock: self.in_stock,
        })
    }
}

//! System prompt for the shopping assistant.

use askama::Template;
use rust_decimal::Decimal;

use bloom_core::Price;

use super::AiError;
use crate::models::{Category, Product, StoreSettings};

/// Product summary shown to the model.
pub struct PromptProduct {
    pub name: String,
    pub price: String,
    pub category: Option<String>,
}

#[derive(Template)]
#[template(path = "ai/system_prompt.txt")]
struct SystemPromptTemplate<'a> {
    store_name: &'a str,
    delivery_fee: String,
    free_delivery_threshold: String,
    products: Vec<PromptProduct>,
}

/// Render the system prompt with the in-stock catalog.
///
/// # Errors
///
/// Returns `AiError::Template` if rendering fails.
pub fn render_system_prompt(
    settings: &StoreSettings,
    products: &[Product],
    categories: &[Category],
) -> Result<String, AiError> {
    let money = |amount: Decimal| Price::new(amount, settings.currency).display();

    let products = products
        .iter()
        .filter(|product| product.in_stock)
        .map(|product| PromptProduct {
            name: product.name.clone(),
            price: money(product.price),
            category: product.category_id.and_then(|id| {
                categories
                    .iter()
                    .find(|category| category.id == id)
                    .map(|category| category.name.clone())
            }),
        })
        .collect();

    let template = SystemPromptTemplate {
        store_name: &settings.store_name,
        delivery_fee: money(settings.delivery_fee),
        free_delivery_threshold: money(settings.free_delivery_threshold),
        products,
    };

    Ok(template.render()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use bloom_core::{CategoryId, CurrencyCode, ProductId};

    use super::*;

    fn product(id: i32, name: &str, price: i64, in_stock: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            price: Decimal::new(price, 2),
            description: String::new(),
            image: String::new(),
            category_id: Some(CategoryId::new(1)),
            rating: Decimal::ZERO,
            review_count: 0,
            in_stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_prompt_lists_only_in_stock_products() {
        let settings = StoreSettings {
            store_name: "Bloom".to_string(),
            whatsapp_number: "15550102030".to_string(),
            currency: CurrencyCode::USD,
            delivery_fee: Decimal::new(1000, 2),
            free_delivery_threshold: Decimal::new(10000, 2),
        };
        let categories = vec![Category {
            id: CategoryId::new(1),
            name: "Bouquets".to_string(),
            icon: String::new(),
            color: String::new(),
            product_count: 2,
        }];
        let products = vec![
            product(1, "Sunflower Bunch", 1999, true),
            product(2, "Blue Orchid", 4500, false),
        ];

        let prompt = render_system_prompt(&settings, &products, &categories).unwrap();
        assert!(prompt.contains("assistant for Bloom"));
        assert!(prompt.contains("- Sunflower Bunch ($19.99), Bouquets"));
        assert!(!prompt.contains("Blue Orchid"));
        assert!(prompt.contains("costs $10.00, free for orders of $100.00"));
    }

    #[test]
    fn test_prompt_with_empty_catalog() {
        let settings = StoreSettings {
            store_name: "Bloom".to_string(),
            whatsapp_number: "15550102030".to_string(),
            currency: CurrencyCode::GBP,
            delivery_fee: Decimal::new(500, 2),
            free_delivery_threshold: Decimal::new(5000, 2),
        };
        let prompt = render_system_prompt(&settings, &[], &[]).unwrap();
        assert!(prompt.contains("no products are in stock"));
    }
}

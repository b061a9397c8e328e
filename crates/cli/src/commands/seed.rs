//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! categories:
//!   - name: Roses
//!     icon: rose
//!     color: "#e11d48"
//!     products:
//!       - name: Red Roses
//!         price: "25.00"
//!         description: A dozen long-stem red roses
//!       - name: White Roses
//!         price: "22.50"
//!         inStock: false
//! coupons:
//!   - code: SPRING10
//!     discount: 10
//! ```
//!
//! Categories are matched by name and coupons by code, so running the
//! command twice only adds products again.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use bloom_storefront::db::{CategoryRepository, CouponRepository, ProductRepository};
use bloom_storefront::models::{CategoryInput, CouponInput, ProductInput};

use super::connect;

/// Top level of the seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub coupons: Vec<CouponInput>,
}

/// One category and the products filed under it.
#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    #[serde(flatten)]
    pub category: CategoryInput,
    #[serde(default)]
    pub products: Vec<ProductInput>,
}

impl CatalogSeed {
    /// Normalize every entry, collecting all problems.
    fn validated(self) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();
        let mut categories = Vec::with_capacity(self.categories.len());

        for seed in self.categories {
            let label = seed.category.name.clone();
            let category = match seed.category.normalized() {
                Ok(category) => Some(category),
                Err(e) => {
                    errors.push(format!("category '{label}': {e}"));
                    None
                }
            };

            let mut products = Vec::with_capacity(seed.products.len());
            for product in seed.products {
                let name = product.name.clone();
                match product.normalized() {
                    Ok(product) => products.push(product),
                    Err(e) => errors.push(format!("product '{name}' in '{label}': {e}")),
                }
            }

            if let Some(category) = category {
                categories.push(CategorySeed { category, products });
            }
        }

        let mut coupons = Vec::with_capacity(self.coupons.len());
        for coupon in self.coupons {
            let code = coupon.code.clone();
            match coupon.normalized() {
                Ok(coupon) => coupons.push(coupon),
                Err(e) => errors.push(format!("coupon '{code}': {e}")),
            }
        }

        if errors.is_empty() {
            Ok(Self {
                categories,
                coupons,
            })
        } else {
            Err(errors)
        }
    }
}

/// Load `file_path` and create its categories and products.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed, any entry is
/// invalid, or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    let seed = match seed.validated() {
        Ok(seed) => seed,
        Err(errors) => {
            for err in &errors {
                tracing::error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };

    let pool = connect().await?;
    let categories = CategoryRepository::new(&pool);
    let products = ProductRepository::new(&pool);

    let mut existing: HashMap<String, _> = categories
        .list()
        .await?
        .into_iter()
        .map(|c| (c.name.to_lowercase(), c.id))
        .collect();

    let mut created_categories = 0;
    let mut created_products = 0;

    for entry in seed.categories {
        let key = entry.category.name.to_lowercase();
        let category_id = if let Some(id) = existing.get(&key) {
            *id
        } else {
            let category = categories.create(&entry.category).await?;
            created_categories += 1;
            existing.insert(key, category.id);
            category.id
        };

        for mut product in entry.products {
            product.category_id = Some(category_id);
            products.create(&product).await?;
            created_products += 1;
        }
    }

    let coupons = CouponRepository::new(&pool);
    let mut created_coupons = 0;
    for coupon in seed.coupons {
        if coupons.get_by_code(&coupon.code).await?.is_some() {
            info!(code = %coupon.code, "Coupon exists, skipping");
            continue;
        }
        coupons.create(&coupon).await?;
        created_coupons += 1;
    }

    info!("Seeding complete!");
    info!("  Categories created: {created_categories}");
    info!("  Products created: {created_products}");
    info!("  Coupons created: {created_coupons}");

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    const SEED: &str = r##"
categories:
  - name: "  Roses "
    icon: rose
    color: "#e11d48"
    products:
      - name: Red Roses
        price: "25.00"
      - name: White Roses
        price: 22.5
        inStock: false
  - name: Tulips
coupons:
  - code: " spring10 "
    discount: 10
"##;

    #[test]
    fn test_parses_nested_products() {
        let seed: CatalogSeed = serde_yaml::from_str(SEED).unwrap();
        let seed = seed.validated().unwrap();

        assert_eq!(seed.categories.len(), 2);
        let roses = &seed.categories[0];
        assert_eq!(roses.category.name, "Roses");
        assert_eq!(roses.products.len(), 2);
        assert_eq!(roses.products[0].price, Decimal::new(2500, 2));
        assert!(roses.products[0].in_stock);
        assert!(!roses.products[1].in_stock);
        assert!(seed.categories[1].products.is_empty());
        assert_eq!(seed.coupons[0].code, "SPRING10");
        assert!(seed.coupons[0].is_active);
    }

    #[test]
    fn test_collects_every_problem() {
        let yaml = r#"
categories:
  - name: ""
  - name: Lilies
    products:
      - name: ""
        price: "-1"
coupons:
  - code: HALF
    discount: 150
"#;
        let seed: CatalogSeed = serde_yaml::from_str(yaml).unwrap();
        let errors = seed.validated().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[1].contains("Lilies"));
    }
}

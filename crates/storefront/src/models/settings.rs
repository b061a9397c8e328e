//! Runtime store settings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bloom_core::{CurrencyCode, PricingPolicy};

use crate::config::StoreConfig;

/// Effective store settings: stored overrides on top of configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    pub store_name: String,
    pub whatsapp_number: String,
    /// Display currency, from configuration only.
    pub currency: CurrencyCode,
    pub delivery_fee: Decimal,
    pub free_delivery_threshold: Decimal,
}

impl StoreSettings {
    /// Configuration defaults before any stored override.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            store_name: config.name.clone(),
            whatsapp_number: config.whatsapp_number.clone(),
            currency: config.currency,
            delivery_fee: config.delivery_fee,
            free_delivery_threshold: config.free_delivery_threshold,
        }
    }

    /// Delivery rules for pricing.
    #[must_use]
    pub const fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            delivery_fee: self.delivery_fee,
            free_delivery_threshold: self.free_delivery_threshold,
        }
    }
}

/// The subset of settings safe to show shoppers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    pub store_name: String,
    pub currency: CurrencyCode,
    pub currency_symbol: &'static str,
    pub delivery_fee: Decimal,
    pub free_delivery_threshold: Decimal,
}

impl From<StoreSettings> for PublicSettings {
    fn from(settings: StoreSettings) -> Self {
        Self {
            store_name: settings.store_name,
            currency: settings.currency,
            currency_symbol: settings.currency.symbol(),
            delivery_fee: settings.delivery_fee,
            free_delivery_threshold: settings.free_delivery_threshold,
        }
    }
}

/// Partial update of store settings. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettingsUpdate {
    pub store_name: Option<String>,
    pub whatsapp_number: Option<String>,
    pub delivery_fee: Option<Decimal>,
    pub free_delivery_threshold: Option<Decimal>,
}

impl StoreSettingsUpdate {
    /// Trim text fields and check values.
    ///
    /// # Errors
    ///
    /// Returns every problem found, joined into one message.
    pub fn normalized(self) -> Result<Self, String> {
        let mut problems = Vec::new();

        let store_name = self.store_name.map(|name| name.trim().to_string());
        if store_name.as_deref().is_some_and(str::is_empty) {
            problems.push("storeName cannot be empty");
        }

        let whatsapp_number = self.whatsapp_number.map(|number| number.trim().to_string());
        if let Some(number) = &whatsapp_number {
            let digits = number.chars().filter(char::is_ascii_digit).count();
            if !(8..=15).contains(&digits) {
                problems.push("whatsappNumber must have 8 to 15 digits including country code");
            }
        }

        if self.delivery_fee.is_some_and(|fee| fee.is_sign_negative() && !fee.is_zero()) {
            problems.push("deliveryFee must not be negative");
        }
        if self
            .free_delivery_threshold
            .is_some_and(|threshold| threshold.is_sign_negative() && !threshold.is_zero())
        {
            problems.push("freeDeliveryThreshold must not be negative");
        }

        if !problems.is_empty() {
            return Err(problems.join("; "));
        }

        Ok(Self {
            store_name,
            whatsapp_number,
            delivery_fee: self.delivery_fee,
            free_delivery_threshold: self.free_delivery_threshold,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_trims_and_validates() {
        let update = StoreSettingsUpdate {
            store_name: Some("  Petal & Stem ".to_string()),
            whatsapp_number: Some("+44 7700 900123".to_string()),
            ..Default::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(update.store_name.as_deref(), Some("Petal & Stem"));
    }

    #[test]
    fn test_update_rejects_bad_values() {
        let err = StoreSettingsUpdate {
            store_name: Some("   ".to_string()),
            whatsapp_number: Some("123".to_string()),
            delivery_fee: Some(Decimal::new(-1, 0)),
            free_delivery_threshold: None,
        }
        .normalized()
        .unwrap_err();
        assert!(err.contains("storeName"));
        assert!(err.contains("whatsappNumber"));
        assert!(err.contains("deliveryFee"));
    }

    #[test]
    fn test_public_settings_hide_whatsapp_number() {
        let settings = StoreSettings {
            store_name: "Bloom".to_string(),
            whatsapp_number: "15550102030".to_string(),
            currency: CurrencyCode::EUR,
            delivery_fee: Decimal::new(5, 0),
            free_delivery_threshold: Decimal::new(50, 0),
        };
        let json = serde_json::to_value(PublicSettings::from(settings)).unwrap();
        assert!(json.get("whatsappNumber").is_none());
        assert_eq!(json["currencySymbol"], "€");
    }
}

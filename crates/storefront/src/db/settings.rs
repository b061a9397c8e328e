//! Store settings repository.
//!
//! Settings are JSON values stored by key. Keys without a stored value fall
//! back to configuration.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use super::RepositoryError;
use crate::config::StoreConfig;
use crate::models::{StoreSettings, StoreSettingsUpdate};

/// Known setting keys.
pub mod keys {
    pub const STORE_NAME: &str = "store_name";
    pub const WHATSAPP_NUMBER: &str = "whatsapp_number";
    pub const DELIVERY_FEE: &str = "delivery_fee";
    pub const FREE_DELIVERY_THRESHOLD: &str = "free_delivery_threshold";
}

/// Repository for settings database operations.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Effective store settings: stored overrides on top of `defaults`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value has the wrong shape.
    #[instrument(skip(self, defaults))]
    pub async fn store_settings(
        &self,
        defaults: &StoreConfig,
    ) -> Result<StoreSettings, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, JsonValue)>("SELECT key, value FROM shop.settings")
            .fetch_all(self.pool)
            .await?;

        let mut settings = StoreSettings::from_config(defaults);
        for (key, value) in rows {
            match key.as_str() {
                keys::STORE_NAME => settings.store_name = decode(&key, value)?,
                keys::WHATSAPP_NUMBER => settings.whatsapp_number = decode(&key, value)?,
                keys::DELIVERY_FEE => settings.delivery_fee = decode::<Decimal>(&key, value)?,
                keys::FREE_DELIVERY_THRESHOLD => {
                    settings.free_delivery_threshold = decode::<Decimal>(&key, value)?;
                }
                _ => {}
            }
        }

        Ok(settings)
    }

    /// Apply a partial update in one transaction and return the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a write fails.
    #[instrument(skip(self, update, defaults))]
    pub async fn update_store_settings(
        &self,
        update: &StoreSettingsUpdate,
        defaults: &StoreConfig,
    ) -> Result<StoreSettings, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(name) = &update.store_name {
            upsert(&mut tx, keys::STORE_NAME, &JsonValue::from(name.as_str())).await?;
        }
        if let Some(number) = &update.whatsapp_number {
            upsert(&mut tx, keys::WHATSAPP_NUMBER, &JsonValue::from(number.as_str())).await?;
        }
        if let Some(fee) = update.delivery_fee {
            upsert(&mut tx, keys::DELIVERY_FEE, &encode(fee)).await?;
        }
        if let Some(threshold) = update.free_delivery_threshold {
            upsert(&mut tx, keys::FREE_DELIVERY_THRESHOLD, &encode(threshold)).await?;
        }

        tx.commit().await?;
        self.store_settings(defaults).await
    }
}

async fn upsert(conn: &mut PgConnection, key: &str, value: &JsonValue) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO shop.settings (key, value)
        VALUES ($1, $2)
        ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()
        ",
    )
    .bind(key)
    .bind(value)
    .execute(conn)
    .await?;

    Ok(())
}

// Decimals are stored as JSON strings to keep their exact scale.
fn encode(amount: Decimal) -> JsonValue {
    JsonValue::String(amount.to_string())
}

fn decode<T: DeserializeOwned>(key: &str, value: JsonValue) -> Result<T, RepositoryError> {
    serde_json::from_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("setting {key}: {e}")))
}

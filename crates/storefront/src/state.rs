//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::ai::{AiError, OpenAiClient};
use crate::config::StorefrontConfig;
use crate::db::{RepositoryError, SettingsRepository};
use crate::models::StoreSettings;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    ai: Option<OpenAiClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The assistant client is built only when an API key is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the assistant client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, AiError> {
        let ai = config.openai().map(OpenAiClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, pool, ai }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Assistant client, if configured.
    #[must_use]
    pub fn ai(&self) -> Option<&OpenAiClient> {
        self.inner.ai.as_ref()
    }

    /// Effective store settings (stored overrides on configuration).
    ///
    /// # Errors
    ///
    /// Returns an error if the settings can't be read.
    pub async fn store_settings(&self) -> Result<StoreSettings, RepositoryError> {
        SettingsRepository::new(self.pool())
            .store_settings(&self.config().store)
            .await
    }
}

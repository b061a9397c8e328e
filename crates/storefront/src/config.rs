//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BLOOM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `BLOOM_BASE_URL` - Public URL the API is served from
//! - `STORE_WHATSAPP_NUMBER` - Number orders are sent to, e.g. `+1 (555) 010-2030`
//!
//! ## Optional
//! - `BLOOM_HOST` - Bind address (default: 127.0.0.1)
//! - `BLOOM_PORT` - Listen port (default: 3000)
//! - `BLOOM_CORS_ORIGIN` - Origin of the web client, enables CORS with credentials
//! - `STORE_NAME` - Shop name used in messages (default: Bloom Florist)
//! - `STORE_CURRENCY` - ISO currency code for display (default: USD)
//! - `DELIVERY_FEE` - Flat home delivery fee (default: 10.00)
//! - `FREE_DELIVERY_THRESHOLD` - Subtotal that waives the delivery fee (default: 100.00)
//! - `OPENAI_API_KEY` - Enables the AI chat assistant
//! - `OPENAI_MODEL` - Chat model (default: gpt-4o-mini)
//! - `OPENAI_BASE_URL` - OpenAI-compatible API root (default: <https://api.openai.com/v1/>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use bloom_core::{CurrencyCode, PricingPolicy};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_STORE_NAME: &str = "Bloom Florist";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// Web client origin allowed to call the API with cookies
    pub cors_origin: Option<String>,
    /// Shop defaults (overridable at runtime through `shop.settings`)
    pub store: StoreConfig,
    /// AI chat assistant (disabled when `OPENAI_API_KEY` is unset)
    pub openai: Option<OpenAiConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shop identity and delivery pricing defaults.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub name: String,
    /// Number as configured; reduced to digits when building links
    pub whatsapp_number: String,
    pub currency: CurrencyCode,
    pub delivery_fee: Decimal,
    pub free_delivery_threshold: Decimal,
}

impl StoreConfig {
    /// Delivery rules derived from the configured defaults.
    #[must_use]
    pub const fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            delivery_fee: self.delivery_fee,
            free_delivery_threshold: self.free_delivery_threshold,
        }
    }
}

/// OpenAI-compatible chat completions configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API key
    pub api_key: SecretString,
    /// Chat model ID
    pub model: String,
    /// API root; `chat/completions` is joined onto it
    pub base_url: Url,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BLOOM_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("BLOOM_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("BLOOM_PORT", "3000")?;
        let base_url = get_required_env("BLOOM_BASE_URL")?;
        Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("BLOOM_BASE_URL".to_string(), e.to_string()))?;
        let cors_origin = get_optional_env("BLOOM_CORS_ORIGIN");

        let store = StoreConfig::from_env()?;
        let openai = OpenAiConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            cors_origin,
            store,
            openai,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Returns a reference to the AI configuration, if available.
    #[must_use]
    pub const fn openai(&self) -> Option<&OpenAiConfig> {
        self.openai.as_ref()
    }
}

impl StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let whatsapp_number = get_required_env("STORE_WHATSAPP_NUMBER")?;
        validate_whatsapp_number(&whatsapp_number, "STORE_WHATSAPP_NUMBER")?;

        let delivery_fee = parse_env_or_default::<Decimal>("DELIVERY_FEE", "10.00")?;
        let free_delivery_threshold =
            parse_env_or_default::<Decimal>("FREE_DELIVERY_THRESHOLD", "100.00")?;
        for (key, value) in [
            ("DELIVERY_FEE", delivery_fee),
            ("FREE_DELIVERY_THRESHOLD", free_delivery_threshold),
        ] {
            if value.is_sign_negative() {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    "must not be negative".to_string(),
                ));
            }
        }

        Ok(Self {
            name: get_env_or_default("STORE_NAME", DEFAULT_STORE_NAME),
            whatsapp_number,
            currency: get_env_or_default("STORE_CURRENCY", "USD")
                .parse()
                .map_err(|e| ConfigError::InvalidEnvVar("STORE_CURRENCY".to_string(), e))?,
            delivery_fee,
            free_delivery_threshold,
        })
    }
}

impl OpenAiConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_env("OPENAI_API_KEY").filter(|k| !k.is_empty()) else {
            return Ok(None);
        };
        validate_secret_strength(&api_key, "OPENAI_API_KEY")?;

        let base_url = Url::parse(&get_env_or_default(
            "OPENAI_BASE_URL",
            DEFAULT_OPENAI_BASE_URL,
        ))
        .map_err(|e| ConfigError::InvalidEnvVar("OPENAI_BASE_URL".to_string(), e.to_string()))?;

        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            model: get_env_or_default("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            base_url,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// A WhatsApp number needs enough digits to form a `wa.me` link.
fn validate_whatsapp_number(number: &str, var_name: &str) -> Result<(), ConfigError> {
    let digits = number.chars().filter(char::is_ascii_digit).count();
    if !(8..=15).contains(&digits) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("expected 8 to 15 digits including country code (got {digits})"),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by your provider."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/bloom_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            cors_origin: None,
            store: StoreConfig {
                name: DEFAULT_STORE_NAME.to_string(),
                whatsapp_number: "+1 555 010 2030".to_string(),
                currency: CurrencyCode::USD,
                delivery_fee: Decimal::new(1000, 2),
                free_delivery_threshold: Decimal::new(10_000, 2),
            },
            openai: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-openai-key", "OPENAI_API_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("sk-aaaaaaaaaaaaaaaaaaaaaaaa", "OPENAI_API_KEY");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("sk-9fQ2xLm7RtB4vZp1KcW8nHd3", "OPENAI_API_KEY");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_whatsapp_number() {
        assert!(validate_whatsapp_number("+1 (555) 010-2030", "N").is_ok());
        assert!(validate_whatsapp_number("5511987654321", "N").is_ok());
        assert!(validate_whatsapp_number("12345", "N").is_err());
        assert!(validate_whatsapp_number("call me", "N").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure_follows_base_url() {
        let mut config = test_config();
        assert!(!config.is_secure());
        config.base_url = "https://bloomflorist.shop".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_pricing_policy_from_store_config() {
        let policy = test_config().store.pricing_policy();
        assert_eq!(policy.delivery_fee, Decimal::new(10, 0));
        assert_eq!(policy.free_delivery_threshold, Decimal::new(100, 0));
    }

    #[test]
    fn test_openai_config_debug_redacts_key() {
        let config = OpenAiConfig {
            api_key: SecretString::from("sk-super-private-value"),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: Url::parse(DEFAULT_OPENAI_BASE_URL).unwrap(),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("gpt-4o-mini"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk-super-private-value"));
    }
}

//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults target local development.
//!
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 4000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: <http://localhost:4000>)
//! - `COMMERCE_API_URL` - Shop API endpoint (default: <http://localhost:3000/shop-api>)
//! - `COMMERCE_CHANNEL_TOKEN` - Channel token sent with every Shop API call
//! - `CACHE_TTL_SECS` - Default response cache TTL (default: 300)
//! - `CACHE_MAX_CAPACITY` - Maximum cached responses (default: 1000)
//! - `CACHE_SWEEP_INTERVAL_SECS` - Expired-entry sweep interval, 0 disables (default: 600)
//! - `SLOW_QUERY_THRESHOLD_MS` - Slow Shop API call threshold (default: 1000)
//! - `VERBOSE_DIAGNOSTICS` - Emit slow-call warnings (default: false)
//! - `CATALOG_PAGE_SIZE` - Products per catalog page (default: 12)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `json` for structured logs, read by the binary (default: text)

use std::collections::HashMap;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shop API configuration
    pub api: CommerceApiConfig,
    /// Response cache configuration
    pub cache: CacheConfig,
    /// Shop API call diagnostics
    pub diagnostics: DiagnosticsConfig,
    /// Products per catalog page
    pub catalog_page_size: u32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Shop API configuration.
///
/// Implements `Debug` manually to redact the channel token.
#[derive(Clone)]
pub struct CommerceApiConfig {
    /// GraphQL endpoint URL
    pub api_url: String,
    /// Channel token, if the API serves more than one channel
    pub channel_token: Option<SecretString>,
}

impl std::fmt::Debug for CommerceApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceApiConfig")
            .field("api_url", &self.api_url)
            .field(
                "channel_token",
                &self.channel_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Default entry TTL
    pub ttl: Duration,
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Expired-entry sweep interval; `None` disables the sweeper
    pub sweep_interval: Option<Duration>,
}

/// Shop API call diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsConfig {
    /// Calls slower than this are reported
    pub slow_query_threshold: Duration,
    /// Whether slow calls emit warnings
    pub verbose: bool,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from explicit variables, ignoring the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_vars<'a>(
        vars: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parsed("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parsed("STOREFRONT_PORT", "4000")?;
        let base_url = env.or_default("STOREFRONT_BASE_URL", "http://localhost:4000");

        let api = CommerceApiConfig::from_env(&env)?;
        let cache = CacheConfig::from_env(&env)?;
        let diagnostics = DiagnosticsConfig::from_env(&env)?;

        let catalog_page_size: u32 = env.parsed("CATALOG_PAGE_SIZE", "12")?;
        if catalog_page_size == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_PAGE_SIZE".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            base_url,
            api,
            cache,
            diagnostics,
            catalog_page_size,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CommerceApiConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let api_url = env.or_default("COMMERCE_API_URL", "http://localhost:3000/shop-api");
        url::Url::parse(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("COMMERCE_API_URL".to_string(), e.to_string()))?;

        Ok(Self {
            api_url,
            channel_token: env.optional("COMMERCE_CHANNEL_TOKEN").map(SecretString::from),
        })
    }
}

impl CacheConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let ttl_secs: u64 = env.parsed("CACHE_TTL_SECS", "300")?;
        let sweep_secs: u64 = env.parsed("CACHE_SWEEP_INTERVAL_SECS", "600")?;

        Ok(Self {
            ttl: Duration::from_secs(ttl_secs),
            max_capacity: env.parsed("CACHE_MAX_CAPACITY", "1000")?,
            sweep_interval: (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs)),
        })
    }
}

impl DiagnosticsConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let threshold_ms: u64 = env.parsed("SLOW_QUERY_THRESHOLD_MS", "1000")?;
        Ok(Self {
            slow_query_threshold: Duration::from_millis(threshold_ms),
            verbose: env.flag("VERBOSE_DIAGNOSTICS")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment variable lookup.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get and parse a variable with a default value.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Get a boolean flag (`true`/`false`/`1`/`0`/`yes`/`no`), default false.
    fn flag(&self, key: &str) -> Result<bool, ConfigError> {
        let Some(value) = self.optional(key) else {
            return Ok(false);
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        StorefrontConfig::from_vars(vars.iter().copied())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.api.api_url, "http://localhost:3000/shop-api");
        assert!(config.api.channel_token.is_none());
        assert_eq!(config.cache.ttl, Duration::from_secs(300));
        assert_eq!(config.cache.max_capacity, 1000);
        assert_eq!(config.cache.sweep_interval, Some(Duration::from_secs(600)));
        assert_eq!(
            config.diagnostics.slow_query_threshold,
            Duration::from_millis(1000)
        );
        assert!(!config.diagnostics.verbose);
        assert_eq!(config.catalog_page_size, 12);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("STOREFRONT_PORT", "8080"),
            ("COMMERCE_API_URL", "https://shop.example.com/shop-api"),
            ("COMMERCE_CHANNEL_TOKEN", "eu-channel"),
            ("CACHE_SWEEP_INTERVAL_SECS", "0"),
            ("VERBOSE_DIAGNOSTICS", "true"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.api.api_url, "https://shop.example.com/shop-api");
        assert_eq!(
            config.api.channel_token.as_ref().unwrap().expose_secret(),
            "eu-channel"
        );
        assert!(config.cache.sweep_interval.is_none());
        assert!(config.diagnostics.verbose);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("STOREFRONT_PORT", "not-a-port")]),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "STOREFRONT_PORT"
        ));
        assert!(load(&[("COMMERCE_API_URL", "not a url")]).is_err());
        assert!(load(&[("VERBOSE_DIAGNOSTICS", "maybe")]).is_err());
        assert!(load(&[("CATALOG_PAGE_SIZE", "0")]).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = load(&[("STOREFRONT_HOST", "0.0.0.0"), ("STOREFRONT_PORT", "3001")]).unwrap();

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 3001);
    }

    #[test]
    fn test_api_config_debug_redacts_token() {
        let config = CommerceApiConfig {
            api_url: "http://localhost:3000/shop-api".to_string(),
            channel_token: Some(SecretString::from("super_secret_channel_token")),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("localhost:3000"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_channel_token"));
    }
}

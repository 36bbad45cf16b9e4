//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use std::env;
use std::time::Duration;

use storefront_connectors::gateway_rest::SANDBOX_API_URL;
use storefront_exec::checkout::DEFAULT_PAYMENT_TYPE;
use storefront_exec::deadline::{DEFAULT_GATEWAY_TIMEOUT, DEFAULT_STORE_TIMEOUT};
use storefront_exec::Deadlines;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Payment gateway configuration
    pub gateway: GatewayConfig,

    /// Per-call time limits
    pub deadlines: Deadlines,

    /// PostgreSQL connection string (postgres feature)
    pub database_url: Option<String>,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Payment gateway configuration.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Core API base URL
    pub base_url: String,
    /// Server key; also signs callbacks. Absent means the stub gateway is used.
    pub server_key: Option<String>,
    /// Payment type requested on every charge
    pub payment_type: String,
}

// Keeps the server key out of logs
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("server_key", &self.server_key.as_ref().map(|_| "<redacted>"))
            .field("payment_type", &self.payment_type)
            .finish()
    }
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment (uses stubs)
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let environment = Self::load_environment()?;
        let api = Self::load_api_config()?;
        let gateway = Self::load_gateway_config();
        let deadlines = Deadlines::new(
            Self::load_millis_env("STOREFRONT_STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT)?,
            Self::load_millis_env("STOREFRONT_GATEWAY_TIMEOUT_MS", DEFAULT_GATEWAY_TIMEOUT)?,
        );
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        Ok(Self {
            api,
            gateway,
            deadlines,
            database_url,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            gateway: GatewayConfig {
                base_url: SANDBOX_API_URL.to_string(),
                server_key: None,
                payment_type: DEFAULT_PAYMENT_TYPE.to_string(),
            },
            deadlines: Deadlines::default(),
            database_url: None,
            environment: Environment::Test,
        }
    }

    /// Whether the in-process stub gateway should be wired instead of the REST client.
    pub fn use_stub_gateway(&self) -> bool {
        self.environment == Environment::Test || self.gateway.server_key.is_none()
    }

    fn load_environment() -> DaemonResult<Environment> {
        let env_str = env::var("STOREFRONT_ENV").unwrap_or_else(|_| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid STOREFRONT_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_api_config() -> DaemonResult<ApiConfig> {
        let host = env::var("STOREFRONT_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port_str = env::var("STOREFRONT_API_PORT").unwrap_or_else(|_| "8080".to_string());

        let port = port_str
            .parse::<u16>()
            .map_err(|_| DaemonError::Config(format!("Invalid STOREFRONT_API_PORT: {}", port_str)))?;

        Ok(ApiConfig { host, port })
    }

    fn load_gateway_config() -> GatewayConfig {
        GatewayConfig {
            base_url: env::var("STOREFRONT_GATEWAY_URL").unwrap_or_else(|_| SANDBOX_API_URL.to_string()),
            server_key: env::var("STOREFRONT_GATEWAY_SERVER_KEY").ok().filter(|key| !key.is_empty()),
            payment_type: env::var("STOREFRONT_PAYMENT_TYPE")
                .unwrap_or_else(|_| DEFAULT_PAYMENT_TYPE.to_string()),
        }
    }

    fn load_millis_env(key: &str, default: Duration) -> DaemonResult<Duration> {
        match env::var(key) {
            Ok(val) => parse_millis(key, &val),
            Err(_) => Ok(default),
        }
    }
}

fn parse_millis(key: &str, val: &str) -> DaemonResult<Duration> {
    match val.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(DaemonError::Config(format!("Invalid {} value: {}", key, val))),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            gateway: GatewayConfig {
                base_url: SANDBOX_API_URL.to_string(),
                server_key: None,
                payment_type: DEFAULT_PAYMENT_TYPE.to_string(),
            },
            deadlines: Deadlines::default(),
            database_url: None,
            environment: Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.api.port, 8080);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.gateway.payment_type, "gopay");
        assert_eq!(config.deadlines, Deadlines::default());
    }

    #[test]
    fn test_test_config() {
        let config = Config::test();

        assert_eq!(config.api.port, 0);
        assert_eq!(config.environment, Environment::Test);
        assert!(config.use_stub_gateway());
    }

    #[test]
    fn test_stub_gateway_selection() {
        let mut config = Config::default();
        assert!(config.use_stub_gateway());

        config.gateway.server_key = Some("SB-Mid-server-test".to_string());
        assert!(!config.use_stub_gateway());

        config.environment = Environment::Test;
        assert!(config.use_stub_gateway());
    }

    #[test]
    fn test_server_key_redacted_in_debug() {
        let mut config = Config::default();
        config.gateway.server_key = Some("SB-Mid-server-secret".to_string());

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("K", "2500").unwrap(), Duration::from_millis(2500));
        assert!(parse_millis("K", "0").is_err());
        assert!(parse_millis("K", "soon").is_err());
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Test.to_string(), "test");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
    }
}

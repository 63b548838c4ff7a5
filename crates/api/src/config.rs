//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `text` or `json` (default: `text`)
/// - `DATABASE_URL` — PostgreSQL URL; orders are kept in memory when unset
/// - `EXTERNAL_SERVICES_MOCK` — use the sandbox adapters (default: `true`)
/// - `MEMBER_SERVICE_URL`, `PRODUCT_SERVICE_URL`, `PAYMENT_SERVICE_URL`
/// - `EXTERNAL_SERVICE_TIMEOUT_MS` — per-call timeout (default: `5000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub external_services_mock: bool,
    pub member_service_url: String,
    pub product_service_url: String,
    pub payment_service_url: String,
    pub external_service_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let string = |key: &str, default: String| lookup(key).unwrap_or(default);

        Self {
            host: string("HOST", defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: string("RUST_LOG", defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or(defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            external_services_mock: lookup("EXTERNAL_SERVICES_MOCK")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.external_services_mock),
            member_service_url: string("MEMBER_SERVICE_URL", defaults.member_service_url),
            product_service_url: string("PRODUCT_SERVICE_URL", defaults.product_service_url),
            payment_service_url: string("PAYMENT_SERVICE_URL", defaults.payment_service_url),
            external_service_timeout: lookup("EXTERNAL_SERVICE_TIMEOUT_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.external_service_timeout),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            external_services_mock: true,
            member_service_url: "http://localhost:8081".to_string(),
            product_service_url: "http://localhost:8082".to_string(),
            payment_service_url: "http://localhost:8083".to_string(),
            external_service_timeout: Duration::from_millis(5000),
        }
    }
}

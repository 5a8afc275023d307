//! Ticker Stream Configuration Settings
//!
//! Configuration types for the ticker stream, loaded from environment variables.

use crate::domain::asset::{BASE_QUOTE_CURRENCY, QuoteCurrency};

/// Default ticker stream host (scheme is always `wss://`).
pub const DEFAULT_STREAM_HOST: &str = "stream.binance.com:9443/ws";

/// Ticker stream settings.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Host, optional port and path of the stream endpoint, without scheme.
    pub host: String,
    /// Currency the user wants prices shown in.
    pub quote_currency: QuoteCurrency,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_STREAM_HOST.to_string(),
            quote_currency: QuoteCurrency::base(),
        }
    }
}

impl StreamSettings {
    /// Full WebSocket URL of the stream endpoint.
    #[must_use]
    pub fn url(&self) -> String {
        format!("wss://{}", self.host)
    }
}

/// State store settings.
#[derive(Debug, Clone, Copy)]
pub struct StoreSettings {
    /// Snapshots buffered per state observer.
    pub capacity: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { capacity: 1_024 }
    }
}

/// Server port settings.
#[derive(Debug, Clone, Copy)]
pub struct ServerSettings {
    /// Prometheus metrics port (0 = disabled).
    pub metrics_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { metrics_port: 9090 }
    }
}

/// Complete ticker stream configuration.
#[derive(Debug, Clone, Default)]
pub struct TickerConfig {
    /// Stream endpoint and currency.
    pub stream: StreamSettings,
    /// State store settings.
    pub store: StoreSettings,
    /// Server port settings.
    pub server: ServerSettings,
}

impl TickerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a string variable is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_string("TICKER_STREAM_HOST", DEFAULT_STREAM_HOST)?;
        let quote_currency = env_string("TICKER_QUOTE_CURRENCY", BASE_QUOTE_CURRENCY)?;

        let store = StoreSettings {
            capacity: parse_env_usize("TICKER_STATE_CAPACITY", StoreSettings::default().capacity),
        };

        let server = ServerSettings {
            metrics_port: parse_env_u16(
                "TICKER_METRICS_PORT",
                ServerSettings::default().metrics_port,
            ),
        };

        Ok(Self {
            stream: StreamSettings {
                host,
                quote_currency: QuoteCurrency::new(quote_currency),
            },
            store,
            server,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
}

fn env_string(key: &str, default: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::EmptyValue(key.to_string())),
        Ok(value) => Ok(value.trim().to_string()),
        Err(_) => Ok(default.to_string()),
    }
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_settings_defaults() {
        let settings = StreamSettings::default();
        assert_eq!(settings.host, "stream.binance.com:9443/ws");
        assert!(settings.quote_currency.is_base());
    }

    #[test]
    fn url_prefixes_secure_scheme() {
        let settings = StreamSettings {
            host: "example.feed".to_string(),
            quote_currency: QuoteCurrency::base(),
        };
        assert_eq!(settings.url(), "wss://example.feed");
    }

    #[test]
    fn store_settings_defaults() {
        assert_eq!(StoreSettings::default().capacity, 1_024);
    }

    #[test]
    fn server_settings_defaults() {
        assert_eq!(ServerSettings::default().metrics_port, 9090);
    }

    #[test]
    fn unset_variable_uses_default() {
        let value = env_string("TICKER_STREAM_TEST_SURELY_UNSET", "fallback").unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn unparsable_number_uses_default() {
        assert_eq!(parse_env_u16("TICKER_STREAM_TEST_SURELY_UNSET", 7), 7);
        assert_eq!(parse_env_usize("TICKER_STREAM_TEST_SURELY_UNSET", 11), 11);
    }
}

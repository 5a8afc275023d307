//! Tracked Assets and Quote Currencies
//!
//! Identifies the assets this service follows and derives the exchange
//! symbols and ticker topics used to subscribe to them.
//!
//! # Topic Naming
//!
//! ```text
//! primary:   {asset}usdt@ticker      e.g. btcusdt@ticker
//! secondary: {asset}{currency}@ticker e.g. btceur@ticker
//! ```
//!
//! Both parts are lower-cased. The exchange reports symbols upper-cased
//! (`BTCUSDT`) in the `s` field of ticker events.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The exchange's base quote currency. Every asset is always tracked
/// against it on the primary channel.
pub const BASE_QUOTE_CURRENCY: &str = "USDT";

/// Suffix of a 24h rolling ticker topic.
const TICKER_TOPIC_SUFFIX: &str = "@ticker";

// =============================================================================
// Asset
// =============================================================================

/// An asset with its own slot in the shared market state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    /// Bitcoin.
    Btc,
    /// Ether.
    Eth,
    /// BNB.
    Bnb,
}

impl Asset {
    /// Get all tracked assets.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Btc, Self::Eth, Self::Bnb]
    }

    /// Upper-case base symbol, as shown to users.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Eth => "ETH",
            Self::Bnb => "BNB",
        }
    }

    /// Lower-case label used for metrics and topic names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Btc => "btc",
            Self::Eth => "eth",
            Self::Bnb => "bnb",
        }
    }

    /// Exchange symbol of the primary pair (e.g. `BTCUSDT`).
    #[must_use]
    pub fn primary_pair(self) -> String {
        format!("{}{BASE_QUOTE_CURRENCY}", self.symbol())
    }

    /// Ticker topic of the primary pair (e.g. `btcusdt@ticker`).
    #[must_use]
    pub fn primary_topic(self) -> String {
        format!(
            "{}{}{TICKER_TOPIC_SUFFIX}",
            self.as_str(),
            BASE_QUOTE_CURRENCY.to_lowercase()
        )
    }

    /// Ticker topic pairing this asset with `currency` (e.g. `btceur@ticker`).
    #[must_use]
    pub fn topic_for(self, currency: &QuoteCurrency) -> String {
        format!(
            "{}{}{TICKER_TOPIC_SUFFIX}",
            self.as_str(),
            currency.as_str().to_lowercase()
        )
    }

    /// Topics to subscribe to for a given quote currency.
    ///
    /// Only the primary topic when `currency` is the base quote currency,
    /// otherwise the primary topic followed by the cross-rate topic.
    #[must_use]
    pub fn topics(self, currency: &QuoteCurrency) -> Vec<String> {
        if currency.is_base() {
            vec![self.primary_topic()]
        } else {
            vec![self.primary_topic(), self.topic_for(currency)]
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// =============================================================================
// Quote Currency
// =============================================================================

/// Currency a user wants asset prices shown in.
///
/// Kept verbatim: only the exact string `USDT` counts as the base currency,
/// any other value (including `usdt`) enables the cross-rate channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteCurrency(String);

impl QuoteCurrency {
    /// Create a quote currency from a ticker symbol.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// The base quote currency (`USDT`).
    #[must_use]
    pub fn base() -> Self {
        Self(BASE_QUOTE_CURRENCY.to_string())
    }

    /// Whether this is the base quote currency, in which case no
    /// cross-rate channel is needed.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.0 == BASE_QUOTE_CURRENCY
    }

    /// Get the currency symbol as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for QuoteCurrency {
    fn default() -> Self {
        Self::base()
    }
}

impl fmt::Display for QuoteCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuoteCurrency {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

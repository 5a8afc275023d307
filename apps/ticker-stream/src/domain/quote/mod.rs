//! Quote and Market State Types
//!
//! Display-ready market data as read by the UI layer.
//!
//! # Wire Format (JSON)
//!
//! ```json
//! {
//!   "btc": {"base":"BTC","pair":"USDT","price":"100.01","percChange":"1.20",
//!           "volume":"3.456789","currencyPrice":"100.01"},
//!   "eth": {},
//!   "bnb": {},
//!   "prevCurrency": "USDT"
//! }
//! ```
//!
//! Field names and string precision are part of the contract with the
//! renderer and must not change.

mod precision;

pub use precision::{
    PERCENT_PRECISION, PRICE_PRECISION, VOLUME_PRECISION, format_fixed, zero_fixed,
};

use serde::{Deserialize, Serialize};

use super::asset::{Asset, BASE_QUOTE_CURRENCY};

/// Error text recorded when a transport cannot be constructed.
pub const UNABLE_TO_CONNECT: &str = "Unable to connect";

// =============================================================================
// Asset Quote
// =============================================================================

/// Normalized quote for one asset.
///
/// Every field is optional: a quote starts empty and accumulates the union
/// of fields seen across the primary and cross-rate channels. The same type
/// doubles as a partial update, see [`AssetQuote::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetQuote {
    /// Base symbol, e.g. `BTC`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,

    /// Pair symbol, always `USDT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,

    /// Last price, 2 fraction digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    /// Rolling-window percent change, 2 fraction digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perc_change: Option<String>,

    /// Traded base volume, 6 fraction digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,

    /// Price in the user-selected currency, 2 fraction digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_price: Option<String>,
}

impl AssetQuote {
    /// Check if no field has been seen yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.base.is_none()
            && self.pair.is_none()
            && self.price.is_none()
            && self.perc_change.is_none()
            && self.volume.is_none()
            && self.currency_price.is_none()
    }

    /// Shallow-merge `patch` over this quote.
    ///
    /// Fields present in `patch` overwrite, absent fields keep their prior
    /// value. Nothing is ever removed.
    pub fn merge(&mut self, patch: Self) {
        fn overwrite(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }

        overwrite(&mut self.base, patch.base);
        overwrite(&mut self.pair, patch.pair);
        overwrite(&mut self.price, patch.price);
        overwrite(&mut self.perc_change, patch.perc_change);
        overwrite(&mut self.volume, patch.volume);
        overwrite(&mut self.currency_price, patch.currency_price);
    }

    /// Return a copy of this quote with `patch` merged over it.
    #[must_use]
    pub fn merged(&self, patch: Self) -> Self {
        let mut next = self.clone();
        next.merge(patch);
        next
    }
}

// =============================================================================
// Market State
// =============================================================================

/// The complete state observed by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketState {
    /// Bitcoin quote.
    pub btc: AssetQuote,
    /// Ether quote.
    pub eth: AssetQuote,
    /// BNB quote.
    pub bnb: AssetQuote,
    /// Last connection-establishment error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Quote currency used by the most recent update.
    pub prev_currency: String,
}

impl Default for MarketState {
    fn default() -> Self {
        Self {
            btc: AssetQuote::default(),
            eth: AssetQuote::default(),
            bnb: AssetQuote::default(),
            error: None,
            prev_currency: BASE_QUOTE_CURRENCY.to_string(),
        }
    }
}

impl MarketState {
    /// Get the quote slot of an asset.
    #[must_use]
    pub const fn quote(&self, asset: Asset) -> &AssetQuote {
        match asset {
            Asset::Btc => &self.btc,
            Asset::Eth => &self.eth,
            Asset::Bnb => &self.bnb,
        }
    }

    /// Get the mutable quote slot of an asset.
    pub const fn quote_mut(&mut self, asset: Asset) -> &mut AssetQuote {
        match asset {
            Asset::Btc => &mut self.btc,
            Asset::Eth => &mut self.eth,
            Asset::Bnb => &mut self.bnb,
        }
    }
}

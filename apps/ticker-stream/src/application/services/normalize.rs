//! Ticker normalization.
//!
//! Turns the raw fields of one ticker event into the partial quote that is
//! merged into an asset's slot. This is the only place where the
//! zero-default policy and the primary/cross-rate branching live.

use crate::domain::asset::{Asset, BASE_QUOTE_CURRENCY, QuoteCurrency};
use crate::domain::quote::{
    AssetQuote, PERCENT_PRECISION, PRICE_PRECISION, VOLUME_PRECISION, format_fixed,
};

/// Borrowed view of the ticker fields used for quotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickerFields<'a> {
    /// Exchange symbol (`s`).
    pub symbol: Option<&'a str>,
    /// Last price (`c`).
    pub last_price: Option<&'a str>,
    /// Percent change (`P`).
    pub percent_change: Option<&'a str>,
    /// Base volume (`v`).
    pub volume: Option<&'a str>,
}

/// Which subscription a ticker event was attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerChannel {
    /// Asset priced in USDT.
    Primary,
    /// Asset priced in the user-selected currency.
    CrossRate,
}

impl TickerChannel {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::CrossRate => "cross_rate",
        }
    }
}

/// Attribute a ticker event to a channel.
///
/// With the base currency only the primary channel is subscribed, so every
/// event is primary. Otherwise an event is primary only if its symbol is
/// exactly the primary pair; everything else, including events without a
/// symbol, is taken as the cross rate.
#[must_use]
pub fn classify(asset: Asset, currency: &QuoteCurrency, fields: &TickerFields<'_>) -> TickerChannel {
    if currency.is_base() || fields.symbol == Some(asset.primary_pair().as_str()) {
        TickerChannel::Primary
    } else {
        TickerChannel::CrossRate
    }
}

/// Build the partial quote for one ticker event.
#[must_use]
pub fn normalize(asset: Asset, currency: &QuoteCurrency, fields: &TickerFields<'_>) -> AssetQuote {
    match classify(asset, currency, fields) {
        TickerChannel::Primary => {
            let price = format_fixed(fields.last_price, PRICE_PRECISION);
            let currency_price = currency.is_base().then(|| price.clone());

            AssetQuote {
                base: Some(asset.symbol().to_string()),
                pair: Some(BASE_QUOTE_CURRENCY.to_string()),
                perc_change: Some(format_fixed(fields.percent_change, PERCENT_PRECISION)),
                volume: Some(format_fixed(fields.volume, VOLUME_PRECISION)),
                price: Some(price),
                currency_price,
            }
        }
        TickerChannel::CrossRate => AssetQuote {
            currency_price: Some(format_fixed(fields.last_price, PRICE_PRECISION)),
            ..AssetQuote::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn sample(symbol: Option<&'static str>) -> TickerFields<'static> {
        TickerFields {
            symbol,
            last_price: Some("100.005"),
            percent_change: Some("1.2"),
            volume: Some("3.456789"),
        }
    }

    #[test_case(Asset::Btc, "BTC" ; "btc")]
    #[test_case(Asset::Eth, "ETH" ; "eth")]
    #[test_case(Asset::Bnb, "BNB" ; "bnb")]
    fn base_currency_fills_every_field(asset: Asset, base: &str) {
        let quote = normalize(asset, &QuoteCurrency::base(), &sample(None));

        assert_eq!(quote.base.as_deref(), Some(base));
        assert_eq!(quote.pair.as_deref(), Some("USDT"));
        assert_eq!(quote.price.as_deref(), Some("100.01"));
        assert_eq!(quote.perc_change.as_deref(), Some("1.20"));
        assert_eq!(quote.volume.as_deref(), Some("3.456789"));
        assert_eq!(quote.currency_price, quote.price);
    }

    #[test_case(Asset::Btc, "BTCUSDT" ; "btc")]
    #[test_case(Asset::Eth, "ETHUSDT" ; "eth")]
    #[test_case(Asset::Bnb, "BNBUSDT" ; "bnb")]
    fn cross_currency_primary_event_leaves_currency_price(asset: Asset, pair: &'static str) {
        let quote = normalize(asset, &QuoteCurrency::new("EUR"), &sample(Some(pair)));

        assert_eq!(quote.price.as_deref(), Some("100.01"));
        assert_eq!(quote.volume.as_deref(), Some("3.456789"));
        assert!(quote.currency_price.is_none());
    }

    #[test]
    fn cross_currency_other_symbol_sets_only_currency_price() {
        let quote = normalize(
            Asset::Btc,
            &QuoteCurrency::new("EUR"),
            &sample(Some("BTCEUR")),
        );

        assert_eq!(
            quote,
            AssetQuote {
                currency_price: Some("100.01".to_string()),
                ..AssetQuote::default()
            }
        );
    }

    #[test]
    fn missing_symbol_falls_through_to_cross_rate() {
        let currency = QuoteCurrency::new("EUR");
        assert_eq!(
            classify(Asset::Eth, &currency, &sample(None)),
            TickerChannel::CrossRate
        );
    }

    #[test]
    fn symbol_match_is_exact() {
        let currency = QuoteCurrency::new("EUR");
        assert_eq!(
            classify(Asset::Btc, &currency, &sample(Some("btcusdt"))),
            TickerChannel::CrossRate
        );
        assert_eq!(
            classify(Asset::Btc, &currency, &sample(Some("ETHUSDT"))),
            TickerChannel::CrossRate
        );
    }

    #[test]
    fn missing_numbers_default_to_zero() {
        let quote = normalize(Asset::Bnb, &QuoteCurrency::base(), &TickerFields::default());

        assert_eq!(quote.price.as_deref(), Some("0.00"));
        assert_eq!(quote.perc_change.as_deref(), Some("0.00"));
        assert_eq!(quote.volume.as_deref(), Some("0.000000"));
        assert_eq!(quote.currency_price.as_deref(), Some("0.00"));
    }
}

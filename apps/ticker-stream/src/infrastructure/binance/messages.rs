//! Binance WebSocket Message Types
//!
//! Wire format types for the exchange's ticker streams.
//!
//! # Message Types
//!
//! ## Outbound
//! - `SubscriptionRequest`: `SUBSCRIBE` command naming ticker topics
//!
//! ## Inbound
//! - `TickerMessage`: 24h rolling window ticker event
//! - `ControlReply`: response to a command (`{"result":null,"id":1}`)
//!
//! # References
//!
//! - [Individual Symbol Ticker Streams](https://developers.binance.com/docs/binance-spot-api-docs/web-socket-streams#individual-symbol-ticker-streams)
//! - [Live Subscribing](https://developers.binance.com/docs/binance-spot-api-docs/web-socket-streams#live-subscribingunsubscribing-to-streams)

use serde::{Deserialize, Deserializer, Serialize};

use crate::application::services::TickerFields;

/// Request id carried by every subscribe command.
pub const SUBSCRIBE_REQUEST_ID: u64 = 1;

// =============================================================================
// Outbound Commands
// =============================================================================

/// Subscribe command.
///
/// # Wire Format (JSON)
/// ```json
/// {"method": "SUBSCRIBE", "params": ["btcusdt@ticker", "btceur@ticker"], "id": 1}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    /// Command name (always "SUBSCRIBE").
    pub method: String,

    /// Topics to subscribe to.
    pub params: Vec<String>,

    /// Request id echoed in the reply.
    pub id: u64,
}

impl SubscriptionRequest {
    /// Create a subscribe command for `topics`.
    #[must_use]
    pub fn subscribe(topics: Vec<String>) -> Self {
        Self {
            method: "SUBSCRIBE".to_string(),
            params: topics,
            id: SUBSCRIBE_REQUEST_ID,
        }
    }
}

// =============================================================================
// Inbound Events
// =============================================================================

/// 24h rolling window ticker event.
///
/// Only the fields used for quotes are decoded; everything else in the event
/// is ignored.
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "e": "24hrTicker",
///   "E": 1672515782136,
///   "s": "BNBBTC",
///   "p": "0.0015",
///   "P": "250.00",
///   "c": "0.0025",
///   "v": "10000",
///   ...
/// }
/// ```
///
/// Every field is optional and read leniently: a string is kept as is, a
/// number is kept as its decimal text, anything else (`null`, booleans,
/// objects) counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TickerMessage {
    /// Event type, normally `24hrTicker`.
    #[serde(rename = "e", default, deserialize_with = "lenient_text")]
    pub event_type: Option<String>,

    /// Exchange symbol (e.g. `BTCUSDT`).
    #[serde(rename = "s", default, deserialize_with = "lenient_text")]
    pub symbol: Option<String>,

    /// Last price.
    #[serde(rename = "c", default, deserialize_with = "lenient_text")]
    pub last_price: Option<String>,

    /// Price change percent over the window.
    #[serde(rename = "P", default, deserialize_with = "lenient_text")]
    pub price_change_percent: Option<String>,

    /// Total traded base asset volume.
    #[serde(rename = "v", default, deserialize_with = "lenient_text")]
    pub volume: Option<String>,
}

impl TickerMessage {
    /// Borrow the fields used for normalization.
    #[must_use]
    pub fn fields(&self) -> TickerFields<'_> {
        TickerFields {
            symbol: self.symbol.as_deref(),
            last_price: self.last_price.as_deref(),
            percent_change: self.price_change_percent.as_deref(),
            volume: self.volume.as_deref(),
        }
    }
}

/// Error detail of a rejected command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplyError {
    /// Exchange error code.
    pub code: i64,
    /// Error description.
    pub msg: String,
}

/// Reply to a command sent on the stream.
///
/// # Wire Format (JSON)
/// ```json
/// {"result": null, "id": 1}
/// {"error": {"code": 2, "msg": "Invalid request"}, "id": 1}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ControlReply {
    /// Id of the command this replies to.
    #[serde(default)]
    pub id: Option<u64>,

    /// Result payload, `null` on success.
    #[serde(default)]
    pub result: Option<serde_json::Value>,

    /// Error detail if the command was rejected.
    #[serde(default)]
    pub error: Option<ReplyError>,
}

impl ControlReply {
    /// Check if the command was accepted.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Ticker event.
    Ticker(TickerMessage),
    /// Command reply.
    Reply(ControlReply),
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text),
        Some(serde_json::Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

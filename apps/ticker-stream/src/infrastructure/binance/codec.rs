//! Stream Codec Module
//!
//! JSON encoding and decoding for the exchange's ticker streams.
//!
//! Inbound frames are single JSON objects. Three shapes are recognised:
//!
//! ```json
//! {"e":"24hrTicker","s":"BTCUSDT","c":"27000.10",...}            // ticker
//! {"result":null,"id":1}                                         // reply
//! {"stream":"btcusdt@ticker","data":{"e":"24hrTicker",...}}       // envelope
//! ```
//!
//! Envelopes (combined stream endpoints) are unwrapped to their `data`.
//! Any other object is decoded as a ticker whose missing fields are absent.

use serde_json::{Map, Value};

use super::messages::{ControlReply, InboundFrame, SubscriptionRequest, TickerMessage};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid message format.
    #[error("invalid message format: {0}")]
    InvalidFormat(String),
}

/// JSON codec for ticker streams.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or not a JSON object.
    pub fn decode(&self, text: &str) -> Result<InboundFrame, CodecError> {
        let value: Value = serde_json::from_str(text)?;

        let Value::Object(mut object) = value else {
            return Err(CodecError::InvalidFormat(format!(
                "expected JSON object, got: {}...",
                preview(text)
            )));
        };

        if is_envelope(&object) {
            match object.remove("data") {
                Some(Value::Object(inner)) => object = inner,
                _ => {
                    return Err(CodecError::InvalidFormat(
                        "stream envelope without object data".to_string(),
                    ));
                }
            }
        }

        if is_reply(&object) {
            let reply: ControlReply = serde_json::from_value(Value::Object(object))?;
            return Ok(InboundFrame::Reply(reply));
        }

        let ticker: TickerMessage = serde_json::from_value(Value::Object(object))?;
        Ok(InboundFrame::Ticker(ticker))
    }

    /// Encode a subscribe command.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode(&self, request: &SubscriptionRequest) -> Result<String, CodecError> {
        Ok(serde_json::to_string(request)?)
    }
}

fn is_envelope(object: &Map<String, Value>) -> bool {
    object.get("stream").is_some_and(Value::is_string) && object.contains_key("data")
}

fn is_reply(object: &Map<String, Value>) -> bool {
    object.contains_key("id")
        && (object.contains_key("result") || object.contains_key("error"))
        && !object.contains_key("s")
}

fn preview(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(50) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}

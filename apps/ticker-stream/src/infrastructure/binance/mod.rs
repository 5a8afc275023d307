//! Exchange Ticker Adapters
//!
//! WebSocket client for the exchange's public 24h ticker streams:
//!
//! - **messages**: Subscribe command and inbound frame types
//! - **codec**: JSON framing
//! - **ticker**: Per-asset connection that merges tickers into state

pub mod codec;
pub mod messages;
pub mod ticker;

pub use codec::{CodecError, JsonCodec};
pub use messages::{
    ControlReply, InboundFrame, ReplyError, SUBSCRIBE_REQUEST_ID, SubscriptionRequest,
    TickerMessage,
};
pub use ticker::{ConnectionHandle, ConnectionState, TickerAdapter, TickerClientError};

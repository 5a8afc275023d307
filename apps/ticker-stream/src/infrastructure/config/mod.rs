//! Configuration Module
//!
//! Configuration loading for the ticker stream service.

mod settings;

pub use settings::{
    ConfigError, DEFAULT_STREAM_HOST, ServerSettings, StoreSettings, StreamSettings, TickerConfig,
};

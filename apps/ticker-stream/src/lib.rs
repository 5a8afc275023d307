#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::items_after_statements
    )
)]

//! Ticker Stream - Market Ticker State Feed
//!
//! Subscribes to an exchange's public 24h ticker WebSocket streams for BTC,
//! ETH and BNB, turns each event into display-ready strings and merges it
//! into one observable market state.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Tracked assets, quote slots and display formatting
//!   - `asset`: Assets, quote currencies and stream topic names
//!   - `quote`: Per-asset quote slots and the shared market state
//!
//! - **Application**: Use cases
//!   - `services`: Ticker normalization (primary vs cross-rate)
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `binance`: WebSocket ticker adapters
//!   - `store`: Observable market state store
//!   - `config`: Configuration from environment
//!   - `metrics`, `telemetry`: Observability
//!
//! # Data Flow
//!
//! ```text
//! btcusdt@ticker ──► BTC adapter ──┐
//! ethusdt@ticker ──► ETH adapter ──┼──► StateStore ──► observers (UI)
//! bnbusdt@ticker ──► BNB adapter ──┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Assets, quotes and formatting with no I/O.
pub mod domain;

/// Application layer - Use cases.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::asset::{Asset, BASE_QUOTE_CURRENCY, QuoteCurrency};
pub use domain::quote::{AssetQuote, MarketState, UNABLE_TO_CONNECT};

// Normalization
pub use application::services::{TickerChannel, TickerFields, normalize};

// Ticker adapters
pub use infrastructure::binance::{
    ConnectionHandle, ConnectionState, TickerAdapter, TickerClientError,
};

// State store
pub use infrastructure::store::{StateStore, StateSubscription, StoreConfig};

// Infrastructure config
pub use infrastructure::config::{ConfigError, TickerConfig};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};

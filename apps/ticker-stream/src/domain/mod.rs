//! Domain Layer - Core market data types.
//!
//! This layer contains the assets, quotes and state shape shared with the UI,
//! with no I/O. All types here are pure Rust with serialization support.

/// Tracked assets, quote currencies and ticker topic naming.
pub mod asset;

/// Normalized quotes, market state and display formatting.
pub mod quote;

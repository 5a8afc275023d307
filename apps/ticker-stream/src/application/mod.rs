//! Application Layer - Use cases.
//!
//! This layer holds the logic that sits between decoded exchange events and
//! the market state, independent of the transport.

/// Ticker normalization shared by all asset adapters.
pub mod services;

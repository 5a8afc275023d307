//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete transports and shared services around the domain types.

/// Exchange ticker WebSocket adapters.
pub mod binance;

/// Observable market state store.
pub mod store;

/// Configuration loaded from the environment.
pub mod config;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// OpenTelemetry tracing integration.
pub mod telemetry;

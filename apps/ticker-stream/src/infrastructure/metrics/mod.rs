//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Frames**: Ticker frames received and rejected per asset
//! - **Connections**: Open ticker connections and failed connection attempts
//! - **State**: Store updates and snapshots skipped by slow observers
//! - **Latency**: Frame processing time
//!
//! # Integration
//!
//! When a listen port is given, metrics are served at `/metrics`.

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::application::services::TickerChannel;
use crate::domain::asset::Asset;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Only the first call installs a recorder; later calls return the same
/// handle.
///
/// # Errors
///
/// Returns an error if the recorder cannot be installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Start the Prometheus exporter with an HTTP listener on `addr`.
///
/// # Errors
///
/// Returns an error if the exporter cannot be installed.
pub fn init_metrics_server(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    register_metrics();
    Ok(())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    // Frame counters
    describe_counter!(
        "ticker_stream_frames_received_total",
        "Total ticker frames merged into state"
    );
    describe_counter!(
        "ticker_stream_decode_errors_total",
        "Total frames rejected by the codec"
    );

    // Connection metrics
    describe_gauge!(
        "ticker_stream_connections",
        "Number of open ticker WebSocket connections"
    );
    describe_counter!(
        "ticker_stream_connect_failures_total",
        "Total failed ticker connection attempts"
    );
    describe_counter!(
        "ticker_stream_websocket_errors_total",
        "Total WebSocket errors by type"
    );

    // State store
    describe_counter!(
        "ticker_stream_state_updates_total",
        "Total market state updates"
    );
    describe_counter!(
        "ticker_stream_observer_lagged_total",
        "Total snapshots skipped by slow state observers"
    );

    // Latency histograms
    describe_histogram!(
        "ticker_stream_frame_processing_seconds",
        "Time to decode and merge a ticker frame"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a ticker frame merged into state.
pub fn record_frame_received(asset: Asset, channel: TickerChannel) {
    counter!(
        "ticker_stream_frames_received_total",
        "asset" => asset.as_str(),
        "channel" => channel.as_str()
    )
    .increment(1);
}

/// Record a frame the codec rejected.
pub fn record_decode_error(asset: Asset) {
    counter!(
        "ticker_stream_decode_errors_total",
        "asset" => asset.as_str()
    )
    .increment(1);
}

/// Adjust the open connection gauge for an asset.
pub fn adjust_connections(asset: Asset, delta: f64) {
    gauge!(
        "ticker_stream_connections",
        "asset" => asset.as_str()
    )
    .increment(delta);
}

/// Record a failed connection attempt.
pub fn record_connect_failure(asset: Asset) {
    counter!(
        "ticker_stream_connect_failures_total",
        "asset" => asset.as_str()
    )
    .increment(1);
}

/// Record a WebSocket error.
pub fn record_websocket_error(asset: Asset, error_type: &str) {
    counter!(
        "ticker_stream_websocket_errors_total",
        "asset" => asset.as_str(),
        "error_type" => error_type.to_string()
    )
    .increment(1);
}

/// Record a market state update.
pub fn record_state_update() {
    counter!("ticker_stream_state_updates_total").increment(1);
}

/// Record snapshots skipped by a lagging observer.
pub fn record_observer_lagged(skipped: u64) {
    counter!("ticker_stream_observer_lagged_total").increment(skipped);
}

/// Record frame processing duration.
pub fn record_processing_duration(asset: Asset, duration: Duration) {
    histogram!(
        "ticker_stream_frame_processing_seconds",
        "asset" => asset.as_str()
    )
    .record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================

//! Ticker Stream Binary
//!
//! Connects the BTC, ETH and BNB ticker adapters to one state store and logs
//! every state change until shutdown.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin ticker-stream
//! ```
//!
//! # Environment Variables
//!
//! - `TICKER_STREAM_HOST`: Stream host and path, no scheme (default: stream.binance.com:9443/ws)
//! - `TICKER_QUOTE_CURRENCY`: Display currency (default: USDT)
//! - `TICKER_STATE_CAPACITY`: Snapshots buffered per observer (default: 1024)
//! - `TICKER_METRICS_PORT`: Prometheus metrics port, 0 disables (default: 9090)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: ticker-stream)
//! - `RUST_LOG`: Log level (default: info)

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use ticker_stream::infrastructure::metrics::init_metrics_server;
use ticker_stream::infrastructure::telemetry;
use ticker_stream::{Asset, ConnectionHandle, StateStore, StoreConfig, TickerAdapter, TickerConfig};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Time allowed for sessions to send their close frames.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("Failed to install rustls crypto provider");
    }

    load_dotenv();

    // Initialize telemetry (tracing + optional OTLP)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Ticker Stream");

    let config = TickerConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    if config.server.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.metrics_port));
        init_metrics_server(addr).context("failed to start metrics exporter")?;
        tracing::info!(addr = %addr, "Metrics exporter listening");
    }

    let store = StateStore::new(StoreConfig::from(config.store));
    let shutdown_token = CancellationToken::new();

    // Spawn state observer
    let mut observer = store.subscribe();
    let observer_shutdown = shutdown_token.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = observer_shutdown.cancelled() => break,
                state = observer.next() => {
                    let Some(state) = state else { break };
                    match serde_json::to_string(&*state) {
                        Ok(json) => tracing::info!(state = %json, "Market state"),
                        Err(e) => tracing::warn!(error = %e, "Failed to serialize market state"),
                    }
                }
            }
        }
    });

    // Connect one adapter per asset
    let mut handles: Vec<ConnectionHandle> = Vec::new();
    for &asset in Asset::all() {
        let adapter = TickerAdapter::new(asset, store.clone());
        match adapter.connect(&config.stream.host, config.stream.quote_currency.clone()) {
            Ok(handle) => handles.push(handle),
            Err(e) => tracing::error!(asset = %asset, error = %e, "Ticker adapter failed to start"),
        }
    }

    tracing::info!(connections = handles.len(), "Ticker stream ready");

    await_shutdown(shutdown_token).await;

    for handle in &handles {
        handle.close();
    }
    let closing = futures_util::future::join_all(handles.into_iter().map(ConnectionHandle::closed));
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, closing).await.is_err() {
        tracing::warn!("Timed out waiting for ticker sessions to close");
    }

    tracing::info!("Ticker stream stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &TickerConfig) {
    tracing::info!(
        url = %config.stream.url(),
        quote_currency = %config.stream.quote_currency,
        state_capacity = config.store.capacity,
        metrics_port = config.server.metrics_port,
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}

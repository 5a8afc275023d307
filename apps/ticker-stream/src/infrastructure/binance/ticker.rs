//! Ticker WebSocket Adapter
//!
//! Connects one tracked asset to the exchange's ticker streams and merges
//! every ticker event into the shared [`StateStore`].
//!
//! # Stream URL
//!
//! `wss://{endpoint_host}`, e.g. `wss://stream.binance.com:9443/ws`
//!
//! # Protocol
//!
//! ```text
//! Connecting ──open──► Open ──first frame──► Receiving ──end──► Closed
//!                       │
//!                       └─ send {"method":"SUBSCRIBE","params":[...],"id":1}
//! ```
//!
//! There is no reconnection: when the socket errors or the server closes it,
//! the session ends and the handle reports [`ConnectionState::Closed`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message, client::IntoClientRequest};
use tokio_util::sync::CancellationToken;

use super::codec::{CodecError, JsonCodec};
use super::messages::{InboundFrame, SubscriptionRequest};
use crate::application::services::{classify, normalize};
use crate::domain::asset::{Asset, QuoteCurrency};
use crate::domain::quote::UNABLE_TO_CONNECT;
use crate::infrastructure::metrics;
use crate::infrastructure::store::StateStore;

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur in the ticker adapter.
#[derive(Debug, thiserror::Error)]
pub enum TickerClientError {
    /// The transport could not be constructed.
    #[error("unable to connect to {url}: {reason}")]
    UnableToConnect {
        /// Target URL.
        url: String,
        /// Why construction failed.
        reason: String,
    },

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// Codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Connection closed by the server or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,
}

impl TickerClientError {
    const fn kind(&self) -> &'static str {
        match self {
            Self::UnableToConnect { .. } => "unable_to_connect",
            Self::WebSocket(_) => "websocket",
            Self::Codec(_) => "codec",
            Self::ConnectionClosed => "closed",
        }
    }
}

// =============================================================================
// Connection Handle
// =============================================================================

/// Lifecycle state of one ticker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport is being established.
    Connecting,
    /// Transport is open and the subscribe command was sent.
    Open,
    /// At least one frame has been received.
    Receiving,
    /// Session ended.
    Closed,
}

#[derive(Debug)]
struct ConnectionStatus {
    state: RwLock<ConnectionState>,
    opened_at: RwLock<Option<DateTime<Utc>>>,
    frames_received: AtomicU64,
}

impl ConnectionStatus {
    const fn new() -> Self {
        Self {
            state: RwLock::new(ConnectionState::Connecting),
            opened_at: RwLock::new(None),
            frames_received: AtomicU64::new(0),
        }
    }

    fn mark_open(&self) {
        *self.opened_at.write() = Some(Utc::now());
        *self.state.write() = ConnectionState::Open;
    }

    fn mark_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.write();
        if *state == ConnectionState::Open {
            *state = ConnectionState::Receiving;
        }
    }

    fn mark_closed(&self) {
        *self.state.write() = ConnectionState::Closed;
    }
}

/// Handle to a live ticker connection.
///
/// Dropping the handle does not close the connection; call
/// [`ConnectionHandle::close`] for that.
#[derive(Debug)]
pub struct ConnectionHandle {
    asset: Asset,
    url: String,
    status: Arc<ConnectionStatus>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    /// Asset this connection feeds.
    #[must_use]
    pub const fn asset(&self) -> Asset {
        self.asset
    }

    /// URL the connection was opened against.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.status.state.read()
    }

    /// When the transport opened, if it has.
    #[must_use]
    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        *self.status.opened_at.read()
    }

    /// Number of text frames received.
    #[must_use]
    pub fn frames_received(&self) -> u64 {
        self.status.frames_received.load(Ordering::Relaxed)
    }

    /// Ask the session to send a close frame and stop.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Check if the session has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end.
    pub async fn closed(self) {
        if let Err(e) = self.task.await {
            tracing::error!(asset = %self.asset, error = %e, "Ticker session task failed");
        }
    }
}

// =============================================================================
// Ticker Adapter
// =============================================================================

/// Ticker adapter for one asset.
///
/// Every connection it opens writes into the asset's slot of the shared
/// store. Connections are not tracked: connecting twice yields two
/// independent sessions feeding the same slot.
#[derive(Debug, Clone)]
pub struct TickerAdapter {
    asset: Asset,
    store: StateStore,
    codec: JsonCodec,
}

impl TickerAdapter {
    /// Create an adapter for `asset` writing into `store`.
    #[must_use]
    pub const fn new(asset: Asset, store: StateStore) -> Self {
        Self {
            asset,
            store,
            codec: JsonCodec::new(),
        }
    }

    /// Asset this adapter feeds.
    #[must_use]
    pub const fn asset(&self) -> Asset {
        self.asset
    }

    /// Subscribe command sent on open for `quote_currency`.
    #[must_use]
    pub fn subscription_request(&self, quote_currency: &QuoteCurrency) -> SubscriptionRequest {
        SubscriptionRequest::subscribe(self.asset.topics(quote_currency))
    }

    /// Open a ticker connection to `wss://{endpoint_host}`.
    ///
    /// Returns as soon as the session task is spawned; the transport opens
    /// and subscribes in the background. Must be called from within a tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TickerClientError::UnableToConnect`] if the URL cannot form
    /// a client request or no runtime is available. In that case the store's
    /// `error` is set to `"Unable to connect"`.
    pub fn connect(
        &self,
        endpoint_host: &str,
        quote_currency: QuoteCurrency,
    ) -> Result<ConnectionHandle, TickerClientError> {
        let url = format!("wss://{endpoint_host}");

        let request = match url.as_str().into_client_request() {
            Ok(request) => request,
            Err(e) => return Err(self.unable_to_connect(url, e.to_string())),
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => return Err(self.unable_to_connect(url, e.to_string())),
        };

        tracing::info!(asset = %self.asset, url = %url, currency = %quote_currency, "Connecting to ticker stream");

        let session = self.session(quote_currency);
        let status = Arc::new(ConnectionStatus::new());
        let cancel = CancellationToken::new();

        let task = runtime.spawn({
            let status = Arc::clone(&status);
            let cancel = cancel.clone();
            async move {
                let result = tokio::select! {
                    () = cancel.cancelled() => Ok(()),
                    connected = tokio_tungstenite::connect_async(request) => match connected {
                        Ok((ws_stream, _response)) => session.run(ws_stream, &status, &cancel).await,
                        Err(e) => {
                            metrics::record_connect_failure(session.asset);
                            Err(e.into())
                        }
                    },
                };
                session.finish(&result, &status);
            }
        });

        Ok(ConnectionHandle {
            asset: self.asset,
            url,
            status,
            cancel,
            task,
        })
    }

    /// Open a ticker connection priced only in the base currency.
    ///
    /// # Errors
    ///
    /// See [`TickerAdapter::connect`].
    pub fn connect_base(&self, endpoint_host: &str) -> Result<ConnectionHandle, TickerClientError> {
        self.connect(endpoint_host, QuoteCurrency::base())
    }

    /// Run a ticker session over an already-open WebSocket stream.
    ///
    /// The subscribe command is sent immediately. Must be called from within
    /// a tokio runtime.
    pub fn attach<S>(&self, ws_stream: S, quote_currency: QuoteCurrency) -> ConnectionHandle
    where
        S: Stream<Item = Result<Message, tungstenite::Error>>
            + Sink<Message, Error = tungstenite::Error>
            + Send
            + Unpin
            + 'static,
    {
        let session = self.session(quote_currency);
        let status = Arc::new(ConnectionStatus::new());
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let status = Arc::clone(&status);
            let cancel = cancel.clone();
            async move {
                let result = session.run(ws_stream, &status, &cancel).await;
                session.finish(&result, &status);
            }
        });

        ConnectionHandle {
            asset: self.asset,
            url: String::new(),
            status,
            cancel,
            task,
        }
    }

    fn session(&self, currency: QuoteCurrency) -> TickerSession {
        TickerSession {
            asset: self.asset,
            store: self.store.clone(),
            codec: self.codec.clone(),
            currency,
        }
    }

    fn unable_to_connect(&self, url: String, reason: String) -> TickerClientError {
        tracing::error!(asset = %self.asset, url = %url, reason = %reason, "Unable to connect");
        metrics::record_connect_failure(self.asset);
        self.store.set_error(UNABLE_TO_CONNECT);
        TickerClientError::UnableToConnect { url, reason }
    }
}

// =============================================================================
// Session
// =============================================================================

struct TickerSession {
    asset: Asset,
    store: StateStore,
    codec: JsonCodec,
    currency: QuoteCurrency,
}

impl TickerSession {
    async fn run<S>(
        &self,
        ws_stream: S,
        status: &ConnectionStatus,
        cancel: &CancellationToken,
    ) -> Result<(), TickerClientError>
    where
        S: Stream<Item = Result<Message, tungstenite::Error>>
            + Sink<Message, Error = tungstenite::Error>
            + Unpin,
    {
        let (mut write, mut read) = ws_stream.split();

        status.mark_open();
        metrics::adjust_connections(self.asset, 1.0);
        tracing::info!(asset = %self.asset, "Ticker stream open");

        let result = self.process(&mut write, &mut read, status, cancel).await;

        metrics::adjust_connections(self.asset, -1.0);
        result
    }

    async fn process<W, R>(
        &self,
        write: &mut W,
        read: &mut R,
        status: &ConnectionStatus,
        cancel: &CancellationToken,
    ) -> Result<(), TickerClientError>
    where
        W: Sink<Message, Error = tungstenite::Error> + Unpin,
        R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        let request = SubscriptionRequest::subscribe(self.asset.topics(&self.currency));
        let json = self.codec.encode(&request)?;

        tracing::debug!(asset = %self.asset, topics = ?request.params, "Sending subscribe request");
        write.send(Message::Text(json.into())).await?;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    // Best effort, the peer may already be gone.
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            status.mark_frame();
                            self.handle_text(&text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(asset = %self.asset, frame = ?frame, "Server sent close frame");
                            return Err(TickerClientError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {
                            // Ignore other message types
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => return Err(TickerClientError::ConnectionClosed),
                    }
                }
            }
        }
    }

    fn handle_text(&self, text: &str) {
        let started = Instant::now();

        match self.codec.decode(text) {
            Ok(InboundFrame::Ticker(ticker)) => {
                let fields = ticker.fields();
                let channel = classify(self.asset, &self.currency, &fields);
                let patch = normalize(self.asset, &self.currency, &fields);

                self.store.merge_quote(self.asset, patch, &self.currency);

                metrics::record_frame_received(self.asset, channel);
                metrics::record_processing_duration(self.asset, started.elapsed());
                tracing::trace!(asset = %self.asset, channel = channel.as_str(), "Ticker merged");
            }
            Ok(InboundFrame::Reply(reply)) => {
                if let Some(error) = reply.error {
                    tracing::warn!(
                        asset = %self.asset,
                        id = ?reply.id,
                        code = error.code,
                        msg = %error.msg,
                        "Subscribe rejected"
                    );
                } else {
                    tracing::debug!(asset = %self.asset, id = ?reply.id, "Subscribe acknowledged");
                }
            }
            Err(e) => {
                tracing::warn!(asset = %self.asset, error = %e, "Dropping undecodable frame");
                metrics::record_decode_error(self.asset);
            }
        }
    }

    fn finish(&self, result: &Result<(), TickerClientError>, status: &ConnectionStatus) {
        status.mark_closed();

        match result {
            Ok(()) => tracing::info!(asset = %self.asset, "Ticker stream closed"),
            Err(TickerClientError::ConnectionClosed) => {
                tracing::info!(asset = %self.asset, "Ticker stream ended");
            }
            Err(e) => {
                tracing::warn!(asset = %self.asset, error = %e, "Ticker stream failed");
                metrics::record_websocket_error(self.asset, e.kind());
            }
        }
    }
}

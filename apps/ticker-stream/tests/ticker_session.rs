//! Ticker Session Integration Tests
//!
//! Drives full adapter sessions over an in-memory WebSocket pair: the test
//! plays the exchange, the adapter writes into a real state store.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::DuplexStream;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::Role;

use ticker_stream::{
    Asset, ConnectionHandle, ConnectionState, MarketState, QuoteCurrency, StateStore,
    StateSubscription, TickerAdapter,
};

const TIMEOUT: Duration = Duration::from_secs(5);

type ExchangeSocket = WebSocketStream<DuplexStream>;

async fn open_session(adapter: &TickerAdapter, currency: &str) -> (ConnectionHandle, ExchangeSocket) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let client = WebSocketStream::from_raw_socket(client_io, Role::Client, None).await;
    let server = WebSocketStream::from_raw_socket(server_io, Role::Server, None).await;

    let handle = adapter.attach(client, QuoteCurrency::new(currency));
    (handle, server)
}

async fn next_message(exchange: &mut ExchangeSocket) -> Message {
    timeout(TIMEOUT, exchange.next())
        .await
        .expect("timed out waiting for client frame")
        .expect("client stream ended")
        .expect("client frame error")
}

async fn read_subscribe(exchange: &mut ExchangeSocket) -> String {
    match next_message(exchange).await {
        Message::Text(text) => text.as_str().to_owned(),
        other => panic!("expected subscribe text frame, got {other:?}"),
    }
}

async fn send_text(exchange: &mut ExchangeSocket, json: &str) {
    exchange.send(Message::text(json.to_owned())).await.unwrap();
}

async fn wait_for<F>(observer: &mut StateSubscription, predicate: F) -> Arc<MarketState>
where
    F: Fn(&MarketState) -> bool,
{
    timeout(TIMEOUT, async {
        loop {
            let state = observer.next().await.expect("store dropped");
            if predicate(&state) {
                return state;
            }
        }
    })
    .await
    .expect("timed out waiting for state")
}

async fn wait_finished(handle: &ConnectionHandle) {
    timeout(TIMEOUT, async {
        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session did not finish");
}

// =============================================================================
// Subscription
// =============================================================================

#[tokio::test]
async fn test_subscribe_payload_for_cross_currency() {
    let adapter = TickerAdapter::new(Asset::Btc, StateStore::with_defaults());
    let (_handle, mut exchange) = open_session(&adapter, "EUR").await;

    assert_eq!(
        read_subscribe(&mut exchange).await,
        r#"{"method":"SUBSCRIBE","params":["btcusdt@ticker","btceur@ticker"],"id":1}"#
    );
}

#[tokio::test]
async fn test_subscribe_payload_for_base_currency() {
    let adapter = TickerAdapter::new(Asset::Bnb, StateStore::with_defaults());
    let (_handle, mut exchange) = open_session(&adapter, "USDT").await;

    assert_eq!(
        read_subscribe(&mut exchange).await,
        r#"{"method":"SUBSCRIBE","params":["bnbusdt@ticker"],"id":1}"#
    );
}

// =============================================================================
// Base Currency
// =============================================================================

#[tokio::test]
async fn test_base_currency_ticker_fills_slot() {
    for &asset in Asset::all() {
        let store = StateStore::with_defaults();
        let mut observer = store.subscribe();
        let adapter = TickerAdapter::new(asset, store.clone());
        let (handle, mut exchange) = open_session(&adapter, "USDT").await;
        read_subscribe(&mut exchange).await;

        let frame = format!(
            r#"{{"e":"24hrTicker","s":"{}","c":"43250.5","P":"1.234","v":"12345.6789"}}"#,
            asset.primary_pair()
        );
        send_text(&mut exchange, &frame).await;

        let state = wait_for(&mut observer, |s| !s.quote(asset).is_empty()).await;
        let quote = state.quote(asset);

        assert_eq!(quote.base.as_deref(), Some(asset.symbol()));
        assert_eq!(quote.pair.as_deref(), Some("USDT"));
        assert_eq!(quote.price.as_deref(), Some("43250.50"));
        assert_eq!(quote.perc_change.as_deref(), Some("1.23"));
        assert_eq!(quote.volume.as_deref(), Some("12345.678900"));
        assert_eq!(quote.currency_price.as_deref(), Some("43250.50"));
        assert_eq!(state.prev_currency, "USDT");
        assert!(state.error.is_none());

        for &other in Asset::all().iter().filter(|&&a| a != asset) {
            assert!(state.quote(other).is_empty());
        }

        assert_eq!(handle.state(), ConnectionState::Receiving);
        assert_eq!(handle.frames_received(), 1);
        assert!(handle.opened_at().is_some());
    }
}

#[tokio::test]
async fn test_missing_fields_become_zero() {
    let store = StateStore::with_defaults();
    let mut observer = store.subscribe();
    let adapter = TickerAdapter::new(Asset::Eth, store.clone());
    let (_handle, mut exchange) = open_session(&adapter, "USDT").await;
    read_subscribe(&mut exchange).await;

    send_text(&mut exchange, r#"{"e":"24hrTicker","s":"ETHUSDT"}"#).await;

    let state = wait_for(&mut observer, |s| !s.eth.is_empty()).await;
    assert_eq!(state.eth.price.as_deref(), Some("0.00"));
    assert_eq!(state.eth.perc_change.as_deref(), Some("0.00"));
    assert_eq!(state.eth.volume.as_deref(), Some("0.000000"));
    assert_eq!(state.eth.currency_price.as_deref(), Some("0.00"));
}

// =============================================================================
// Cross Currency
// =============================================================================

#[tokio::test]
async fn test_cross_currency_branches_by_symbol() {
    let store = StateStore::with_defaults();
    let mut observer = store.subscribe();
    let adapter = TickerAdapter::new(Asset::Btc, store.clone());
    let (_handle, mut exchange) = open_session(&adapter, "EUR").await;
    read_subscribe(&mut exchange).await;

    send_text(
        &mut exchange,
        r#"{"e":"24hrTicker","s":"BTCUSDT","c":"50000","P":"-0.5","v":"10"}"#,
    )
    .await;

    let state = wait_for(&mut observer, |s| s.btc.price.is_some()).await;
    assert_eq!(state.btc.price.as_deref(), Some("50000.00"));
    assert_eq!(state.btc.perc_change.as_deref(), Some("-0.50"));
    assert!(state.btc.currency_price.is_none());
    assert_eq!(state.prev_currency, "EUR");

    send_text(
        &mut exchange,
        r#"{"e":"24hrTicker","s":"BTCEUR","c":"46000.126","P":"9","v":"99"}"#,
    )
    .await;

    let state = wait_for(&mut observer, |s| s.btc.currency_price.is_some()).await;
    assert_eq!(state.btc.currency_price.as_deref(), Some("46000.13"));
    // Cross-rate events leave the primary fields alone.
    assert_eq!(state.btc.price.as_deref(), Some("50000.00"));
    assert_eq!(state.btc.perc_change.as_deref(), Some("-0.50"));
    assert_eq!(state.btc.volume.as_deref(), Some("10.000000"));
}

#[tokio::test]
async fn test_cross_currency_frame_without_symbol_is_cross_rate() {
    let store = StateStore::with_defaults();
    let mut observer = store.subscribe();
    let adapter = TickerAdapter::new(Asset::Eth, store.clone());
    let (_handle, mut exchange) = open_session(&adapter, "GBP").await;
    read_subscribe(&mut exchange).await;

    send_text(&mut exchange, r#"{"c":"1500.5"}"#).await;

    let state = wait_for(&mut observer, |s| !s.eth.is_empty()).await;
    assert_eq!(state.eth.currency_price.as_deref(), Some("1500.50"));
    assert!(state.eth.price.is_none());
    assert_eq!(state.prev_currency, "GBP");
}

// =============================================================================
// Robustness
// =============================================================================

#[tokio::test]
async fn test_malformed_frame_keeps_session_alive() {
    let store = StateStore::with_defaults();
    let mut observer = store.subscribe();
    let adapter = TickerAdapter::new(Asset::Bnb, store.clone());
    let (handle, mut exchange) = open_session(&adapter, "USDT").await;
    read_subscribe(&mut exchange).await;

    send_text(&mut exchange, "not json").await;
    send_text(&mut exchange, r#"{"s":"BNBUSDT","c":"310.4"}"#).await;

    let state = wait_for(&mut observer, |s| !s.bnb.is_empty()).await;
    assert_eq!(state.bnb.price.as_deref(), Some("310.40"));
    assert!(state.error.is_none());
    assert_eq!(handle.frames_received(), 2);
    assert!(!handle.is_finished());
}

#[tokio::test]
async fn test_subscribe_reply_is_not_merged() {
    let store = StateStore::with_defaults();
    let mut observer = store.subscribe();
    let adapter = TickerAdapter::new(Asset::Btc, store.clone());
    let (_handle, mut exchange) = open_session(&adapter, "USDT").await;
    read_subscribe(&mut exchange).await;

    send_text(&mut exchange, r#"{"result":null,"id":1}"#).await;
    send_text(&mut exchange, r#"{"s":"BTCUSDT","c":"1"}"#).await;

    // Initial snapshot, then the ticker update with nothing in between.
    assert!(observer.next().await.unwrap().btc.is_empty());
    let state = timeout(TIMEOUT, observer.next()).await.unwrap().unwrap();
    assert_eq!(state.btc.price.as_deref(), Some("1.00"));
}

#[tokio::test]
async fn test_ping_is_answered() {
    let adapter = TickerAdapter::new(Asset::Eth, StateStore::with_defaults());
    let (_handle, mut exchange) = open_session(&adapter, "USDT").await;
    read_subscribe(&mut exchange).await;

    exchange
        .send(Message::Ping(vec![1, 2, 3].into()))
        .await
        .unwrap();

    match next_message(&mut exchange).await {
        Message::Pong(data) => assert_eq!(&data[..], &[1, 2, 3]),
        other => panic!("expected pong, got {other:?}"),
    }
}

// =============================================================================
// Shared State
// =============================================================================

#[tokio::test]
async fn test_adapters_share_one_store() {
    let store = StateStore::with_defaults();
    let mut observer = store.subscribe();

    let mut sessions = Vec::new();
    for &asset in Asset::all() {
        let adapter = TickerAdapter::new(asset, store.clone());
        let (handle, mut exchange) = open_session(&adapter, "USDT").await;
        read_subscribe(&mut exchange).await;
        sessions.push((asset, handle, exchange));
    }

    for (asset, _handle, exchange) in &mut sessions {
        let frame = format!(r#"{{"s":"{}","c":"2"}}"#, asset.primary_pair());
        send_text(exchange, &frame).await;
    }

    let state = wait_for(&mut observer, |s| {
        Asset::all().iter().all(|&a| s.quote(a).price.is_some())
    })
    .await;

    for &asset in Asset::all() {
        assert_eq!(state.quote(asset).price.as_deref(), Some("2.00"));
        assert_eq!(state.quote(asset).base.as_deref(), Some(asset.symbol()));
    }
}

#[tokio::test]
async fn test_later_ticker_overwrites_earlier() {
    let store = StateStore::with_defaults();
    let mut observer = store.subscribe();
    let adapter = TickerAdapter::new(Asset::Btc, store.clone());
    let (_handle, mut exchange) = open_session(&adapter, "USDT").await;
    read_subscribe(&mut exchange).await;

    send_text(&mut exchange, r#"{"s":"BTCUSDT","c":"1","v":"5"}"#).await;
    send_text(&mut exchange, r#"{"s":"BTCUSDT","c":"2","v":"6"}"#).await;

    let state = wait_for(&mut observer, |s| s.btc.price.as_deref() == Some("2.00")).await;
    assert_eq!(state.btc.volume.as_deref(), Some("6.000000"));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_close_sends_close_frame() {
    let store = StateStore::with_defaults();
    let adapter = TickerAdapter::new(Asset::Eth, store.clone());
    let (handle, mut exchange) = open_session(&adapter, "USDT").await;
    read_subscribe(&mut exchange).await;
    assert_eq!(handle.state(), ConnectionState::Open);

    handle.close();

    assert!(matches!(next_message(&mut exchange).await, Message::Close(_)));
    wait_finished(&handle).await;
    assert_eq!(handle.state(), ConnectionState::Closed);
    assert!(store.snapshot().error.is_none());
}

#[tokio::test]
async fn test_server_close_ends_session_without_error() {
    let store = StateStore::with_defaults();
    let adapter = TickerAdapter::new(Asset::Bnb, store.clone());
    let (handle, mut exchange) = open_session(&adapter, "USDT").await;
    read_subscribe(&mut exchange).await;

    exchange.close(None).await.unwrap();

    wait_finished(&handle).await;
    assert_eq!(handle.state(), ConnectionState::Closed);
    assert!(store.snapshot().error.is_none());
}

#[tokio::test]
async fn test_dropped_transport_ends_session() {
    let store = StateStore::with_defaults();
    let adapter = TickerAdapter::new(Asset::Btc, store.clone());
    let (handle, mut exchange) = open_session(&adapter, "USDT").await;
    read_subscribe(&mut exchange).await;

    drop(exchange);

    wait_finished(&handle).await;
    assert_eq!(handle.state(), ConnectionState::Closed);
    assert!(store.snapshot().btc.is_empty());
    assert!(store.snapshot().error.is_none());
}

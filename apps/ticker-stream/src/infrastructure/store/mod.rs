//! Observable Market State Store
//!
//! Holds the single [`MarketState`] shared by every asset adapter and every
//! observer (the UI layer).
//!
//! # Architecture
//!
//! ```text
//! BTC adapter ──┐                     ┌──► observer 1
//! ETH adapter ──┼──► StateStore ──────┼──► observer 2
//! BNB adapter ──┘  (lock + broadcast) └──► observer N
//! ```
//!
//! Updates are serialized by one write lock and published while the lock is
//! held, so all observers see snapshots in the same order they were applied.
//! Observers run on a bounded broadcast channel: one that falls more than
//! `capacity` snapshots behind skips the oldest ones and carries on.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::domain::asset::{Asset, QuoteCurrency};
use crate::domain::quote::{AssetQuote, MarketState};
use crate::infrastructure::config::StoreSettings;
use crate::infrastructure::metrics;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the observer channel.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Number of snapshots buffered per observer.
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { capacity: 1_024 }
    }
}

impl From<StoreSettings> for StoreConfig {
    fn from(settings: StoreSettings) -> Self {
        Self {
            capacity: settings.capacity,
        }
    }
}

// =============================================================================
// State Store
// =============================================================================

/// Shared, observable market state.
///
/// Cheap to clone; clones share the same state.
///
/// # Example
///
/// ```rust
/// use ticker_stream::infrastructure::store::StateStore;
///
/// let store = StateStore::with_defaults();
/// let mut observer = store.subscribe();
///
/// store.modify(|state| state.error = Some("offline".to_string()));
///
/// // First the state at subscription time, then every update.
/// assert!(observer.try_next().unwrap().error.is_none());
/// assert!(observer.try_next().unwrap().error.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct StateStore {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    state: RwLock<Arc<MarketState>>,
    changes_tx: broadcast::Sender<Arc<MarketState>>,
}

impl StateStore {
    /// Create a store holding the initial (empty) market state.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self::with_state(config, MarketState::default())
    }

    /// Create a store with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }

    /// Create a store holding `state`.
    #[must_use]
    pub fn with_state(config: StoreConfig, state: MarketState) -> Self {
        let (changes_tx, _) = broadcast::channel(config.capacity.max(1));
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(Arc::new(state)),
                changes_tx,
            }),
        }
    }

    /// Get the current state.
    #[must_use]
    pub fn snapshot(&self) -> Arc<MarketState> {
        Arc::clone(&self.inner.state.read())
    }

    /// Replace the state with `f(current)` and notify observers.
    ///
    /// Returns the new state.
    pub fn update<F>(&self, f: F) -> Arc<MarketState>
    where
        F: FnOnce(&MarketState) -> MarketState,
    {
        let mut state = self.inner.state.write();
        let next = Arc::new(f(&state));
        *state = Arc::clone(&next);

        // Err only means nobody is observing right now.
        let _ = self.inner.changes_tx.send(Arc::clone(&next));
        metrics::record_state_update();

        next
    }

    /// Apply an in-place edit to a copy of the current state and publish it.
    pub fn modify<F>(&self, f: F) -> Arc<MarketState>
    where
        F: FnOnce(&mut MarketState),
    {
        self.update(|current| {
            let mut next = current.clone();
            f(&mut next);
            next
        })
    }

    /// Merge a partial quote into an asset's slot and record the quote
    /// currency it was received under.
    pub fn merge_quote(
        &self,
        asset: Asset,
        patch: AssetQuote,
        currency: &QuoteCurrency,
    ) -> Arc<MarketState> {
        self.modify(|state| {
            state.quote_mut(asset).merge(patch);
            currency.as_str().clone_into(&mut state.prev_currency);
        })
    }

    /// Record an error for the UI.
    pub fn set_error(&self, message: impl Into<String>) -> Arc<MarketState> {
        let message = message.into();
        self.modify(|state| state.error = Some(message))
    }

    /// Observe the state: the current snapshot first, then every update.
    #[must_use]
    pub fn subscribe(&self) -> StateSubscription {
        // Holding the read lock keeps updates out between snapshot and subscribe.
        let state = self.inner.state.read();
        StateSubscription {
            pending: Some(Arc::clone(&state)),
            rx: self.inner.changes_tx.subscribe(),
        }
    }

    /// Get the number of live observers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.inner.changes_tx.receiver_count()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Observer handle returned by [`StateStore::subscribe`].
#[derive(Debug)]
pub struct StateSubscription {
    pending: Option<Arc<MarketState>>,
    rx: broadcast::Receiver<Arc<MarketState>>,
}

impl StateSubscription {
    /// Wait for the next snapshot.
    ///
    /// Returns `None` once every store handle has been dropped.
    pub async fn next(&mut self) -> Option<Arc<MarketState>> {
        if let Some(state) = self.pending.take() {
            return Some(state);
        }

        loop {
            match self.rx.recv().await {
                Ok(state) => return Some(state),
                Err(RecvError::Lagged(skipped)) => on_lagged(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next snapshot if one is ready.
    pub fn try_next(&mut self) -> Option<Arc<MarketState>> {
        if let Some(state) = self.pending.take() {
            return Some(state);
        }

        loop {
            match self.rx.try_recv() {
                Ok(state) => return Some(state),
                Err(TryRecvError::Lagged(skipped)) => on_lagged(skipped),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

fn on_lagged(skipped: u64) {
    tracing::warn!(skipped, "State observer lagged, skipping old snapshots");
    metrics::record_observer_lagged(skipped);
}

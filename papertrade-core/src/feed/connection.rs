//! Stream connection lifecycle
//!
//! `LiveFeed` keeps at most one WebSocket connection open, subscribed to
//! exactly the trade streams of the current symbol set. Changing the set is
//! always a full teardown and a fresh connection; there is no incremental
//! subscribe/unsubscribe traffic. Each connection carries a generation
//! number so a superseded reader can never write into the price table after
//! its replacement has been requested.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use super::demux::{demux_frame, FrameOutcome};
use super::error::{FeedError, FeedResult};
use super::publisher::PriceTable;
use super::symbol::{canonical_topic_key, dedup_symbols, Symbol};

/// Feed endpoints and channel sizing.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Combined-stream WebSocket endpoint.
    pub stream_endpoint: String,
    /// REST endpoint used for the price snapshot primer.
    pub rest_endpoint: String,
    /// Capacity of the price-update broadcast channel.
    pub buffer_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            stream_endpoint: "wss://stream.binance.com:9443/stream".to_string(),
            rest_endpoint: "https://api.binance.com".to_string(),
            buffer_size: 1024,
        }
    }
}

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// No symbols requested; no connection.
    Idle,
    /// Connection requested, no frame delivered yet.
    Connecting,
    /// Frames are flowing.
    Open,
    /// Connection ended (remote close, transport error, or shutdown).
    /// No automatic retry; the next symbol-set change reconnects.
    Closed,
}

/// Counters for one feed instance.
#[derive(Debug, Clone, Default)]
pub struct FeedMetrics {
    pub frames_received: u64,
    pub frames_published: u64,
    pub frames_ignored: u64,
    pub parse_errors: u64,
    pub connection_errors: u64,
    pub reconnects: u64,
}

struct ActiveConnection {
    topic_key: String,
    symbols: Arc<Vec<Symbol>>,
    task: JoinHandle<()>,
}

/// Owns the lifecycle of the streaming connection, keyed by the current
/// symbol set.
pub struct LiveFeed {
    config: FeedConfig,
    prices: PriceTable,
    generation: Arc<AtomicU64>,
    status: Arc<RwLock<FeedStatus>>,
    metrics: Arc<RwLock<FeedMetrics>>,
    active: Mutex<Option<ActiveConnection>>,
    disposed: AtomicBool,
}

impl LiveFeed {
    pub fn new(config: FeedConfig) -> Self {
        let prices = PriceTable::new(config.buffer_size);
        Self {
            config,
            prices,
            generation: Arc::new(AtomicU64::new(0)),
            status: Arc::new(RwLock::new(FeedStatus::Idle)),
            metrics: Arc::new(RwLock::new(FeedMetrics::default())),
            active: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Shared handle to the published price table.
    pub fn prices(&self) -> PriceTable {
        self.prices.clone()
    }

    pub fn status(&self) -> FeedStatus {
        *self.status.read()
    }

    pub fn metrics(&self) -> FeedMetrics {
        self.metrics.read().clone()
    }

    /// Current connection generation. Bumped on every teardown.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Topic key of the active connection, if any.
    pub fn topic_key(&self) -> Option<String> {
        self.active.lock().as_ref().map(|conn| conn.topic_key.clone())
    }

    /// Reconcile the connection with the desired symbol set.
    ///
    /// The set's identity is its canonical topic key, so re-ordering or
    /// duplicating symbols is a no-op. A genuinely different set closes the
    /// current connection exactly once and, when non-empty, opens a fresh
    /// one subscribed to the new streams.
    pub fn set_symbols(&self, symbols: &[Symbol]) -> FeedResult<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(FeedError::Shutdown);
        }

        let topic_key = canonical_topic_key(symbols);
        let mut active = self.active.lock();
        match active.as_ref() {
            Some(conn) if conn.topic_key == topic_key => return Ok(()),
            None if topic_key.is_empty() => return Ok(()),
            _ => {}
        }

        // Supersede before tearing down: a frame racing with the swap fails
        // the generation check and can no longer reach the table.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let had_connection = if let Some(old) = active.take() {
            debug!(topic_key = %old.topic_key, "closing superseded stream connection");
            old.task.abort();
            true
        } else {
            false
        };

        if topic_key.is_empty() {
            *self.status.write() = FeedStatus::Idle;
            info!("subscription set empty, feed idle");
            return Ok(());
        }
        if had_connection {
            self.metrics.write().reconnects += 1;
        }

        let candidates = Arc::new(dedup_symbols(symbols));
        *active = Some(self.open_connection(topic_key, candidates, generation)?);
        Ok(())
    }

    /// Force a fresh connection for the current topic set, e.g. after a
    /// transport failure left the feed `Closed`. No-op when idle.
    pub fn refresh(&self) -> FeedResult<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(FeedError::Shutdown);
        }

        let mut active = self.active.lock();
        let Some(old) = active.take() else {
            return Ok(());
        };
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        old.task.abort();
        self.metrics.write().reconnects += 1;

        *active = Some(self.open_connection(old.topic_key, old.symbols, generation)?);
        Ok(())
    }

    fn open_connection(
        &self,
        topic_key: String,
        candidates: Arc<Vec<Symbol>>,
        generation: u64,
    ) -> FeedResult<ActiveConnection> {
        let url = Url::parse(&format!(
            "{}?streams={}",
            self.config.stream_endpoint, topic_key
        ))
        .map_err(|err| FeedError::InvalidEndpoint {
            details: err.to_string(),
        })?;

        *self.status.write() = FeedStatus::Connecting;
        info!(topic_key = %topic_key, generation, "opening stream connection");

        let task = tokio::spawn(connection_task(
            url,
            candidates.clone(),
            generation,
            self.generation.clone(),
            self.prices.clone(),
            self.status.clone(),
            self.metrics.clone(),
        ));
        Ok(ActiveConnection {
            topic_key,
            symbols: candidates,
            task,
        })
    }

    /// Dispose the feed: close any connection and refuse further
    /// subscriptions. Safe to call while still connecting.
    pub fn shutdown(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(conn) = self.active.lock().take() {
            conn.task.abort();
        }
        *self.status.write() = FeedStatus::Closed;
        info!("feed shut down");
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        if let Some(conn) = self.active.lock().take() {
            conn.task.abort();
        }
    }
}

async fn connection_task(
    url: Url,
    candidates: Arc<Vec<Symbol>>,
    my_generation: u64,
    current_generation: Arc<AtomicU64>,
    prices: PriceTable,
    status: Arc<RwLock<FeedStatus>>,
    metrics: Arc<RwLock<FeedMetrics>>,
) {
    let result = drive_connection(
        url,
        &candidates,
        my_generation,
        &current_generation,
        &prices,
        &status,
        &metrics,
    )
    .await;

    if let Err(err) = result {
        warn!(error = %err, generation = my_generation, "stream connection terminated");
        metrics.write().connection_errors += 1;
    }
    // A superseded reader must not touch the status of its replacement.
    if current_generation.load(Ordering::SeqCst) == my_generation {
        *status.write() = FeedStatus::Closed;
    }
}

async fn drive_connection(
    url: Url,
    candidates: &[Symbol],
    my_generation: u64,
    current_generation: &AtomicU64,
    prices: &PriceTable,
    status: &RwLock<FeedStatus>,
    metrics: &RwLock<FeedMetrics>,
) -> FeedResult<()> {
    let (ws_stream, _) = connect_async(url).await?;
    info!(generation = my_generation, "stream connection established");

    let (mut sink, mut stream) = ws_stream.split();
    while let Some(frame) = stream.next().await {
        if current_generation.load(Ordering::SeqCst) != my_generation {
            debug!(generation = my_generation, "connection superseded, stopping reader");
            return Ok(());
        }

        match frame? {
            Message::Text(text) => {
                metrics.write().frames_received += 1;
                let first_frame = { *status.read() == FeedStatus::Connecting };
                if first_frame {
                    *status.write() = FeedStatus::Open;
                }

                match demux_frame(&text, candidates) {
                    FrameOutcome::Price(symbol, price) => {
                        // Re-check: the set may have changed while parsing.
                        if current_generation.load(Ordering::SeqCst) == my_generation {
                            prices.publish(symbol, price);
                            metrics.write().frames_published += 1;
                        }
                    }
                    FrameOutcome::Ignored => {
                        metrics.write().frames_ignored += 1;
                    }
                    FrameOutcome::Malformed => {
                        metrics.write().parse_errors += 1;
                    }
                }
            }
            Message::Ping(payload) => {
                sink.send(Message::Pong(payload)).await?;
            }
            Message::Close(frame) => {
                info!(?frame, "stream closed by remote");
                return Ok(());
            }
            _ => {}
        }
    }
    Ok(())
}

//! Paper-Trading Dashboard Core
//!
//! Live price feed for a changing set of instruments, plus the trade-ledger
//! collaborator it serves. The feed subscribes to the exchange's combined
//! trade streams for every symbol recorded in the ledger, demultiplexes the
//! interleaved stream back to per-symbol prices, and republishes the latest
//! price per symbol. Whenever the ledger's symbol set changes, the
//! connection is torn down and replaced with one subscribed to the new set.

pub mod feed;
pub mod ledger;

// Re-export main types for easy access
pub use feed::{
    FeedConfig, FeedError, FeedMetrics, FeedResult, FeedStatus, LiveFeed, PriceTable, PriceUpdate,
    Symbol,
};
pub use ledger::{
    Direction, InMemoryTradeStore, LedgerError, LedgerResult, LedgerStats, NewTrade, Trade,
    TradePatch, TradeStatus, TradeStore,
};

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use reqwest::Client;
use tokio::sync::broadcast;

/// Dashboard engine: keeps the live feed subscribed to exactly the symbols
/// present in the trade ledger and marks open positions against the price
/// table.
pub struct Dashboard {
    store: Arc<dyn TradeStore>,
    feed: LiveFeed,
    http: Client,
}

impl Dashboard {
    pub fn new(store: Arc<dyn TradeStore>, config: FeedConfig) -> Self {
        Self {
            store,
            feed: LiveFeed::new(config),
            http: Client::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn TradeStore> {
        &self.store
    }

    pub fn feed(&self) -> &LiveFeed {
        &self.feed
    }

    pub fn prices(&self) -> PriceTable {
        self.feed.prices()
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<PriceUpdate> {
        self.feed.prices().subscribe()
    }

    /// Reconcile the feed's subscription set with the ledger.
    ///
    /// Desired state is the distinct symbol set across all recorded trades;
    /// the feed only reconnects when that set actually changes, so calling
    /// this on every refresh cycle is cheap.
    pub async fn sync_feed(&self) -> Result<()> {
        let symbols = self.ledger_symbols().await?;
        self.feed.set_symbols(&symbols)?;
        Ok(())
    }

    /// Prime the price table over REST so positions show a mark before the
    /// stream delivers its first tick. Lookup failures are skipped.
    pub async fn prime_prices(&self) -> Result<()> {
        let symbols = self.ledger_symbols().await?;
        let prices = self.feed.prices();
        let snapshot =
            feed::fetch_spot_prices(&self.http, &self.feed.config().rest_endpoint, &symbols).await;
        for (symbol, price) in snapshot {
            prices.publish(symbol, price);
        }
        Ok(())
    }

    /// Every trade paired with its PnL in percent: the recorded value for
    /// closed trades, mark-to-market for open ones, `None` while an open
    /// trade has no live price yet.
    pub async fn positions_with_pnl(&self) -> Result<Vec<(Trade, Option<f64>)>> {
        let prices = self.feed.prices();
        let trades = self.store.list_trades().await?;
        Ok(trades
            .into_iter()
            .map(|trade| {
                let pnl = if trade.is_open() {
                    prices
                        .get(&trade.symbol)
                        .map(|price| trade.unrealized_pnl_pct(price))
                } else {
                    Some(trade.pnl.unwrap_or(0.0))
                };
                (trade, pnl)
            })
            .collect())
    }

    pub async fn stats(&self) -> Result<LedgerStats> {
        Ok(self.store.stats().await?)
    }

    pub fn shutdown(&self) {
        self.feed.shutdown();
    }

    async fn ledger_symbols(&self) -> Result<Vec<Symbol>> {
        let trades = self.store.list_trades().await?;
        let mut seen = HashSet::new();
        let mut symbols = Vec::new();
        for trade in trades {
            if seen.insert(trade.symbol.clone()) {
                symbols.push(trade.symbol);
            }
        }
        Ok(symbols)
    }
}

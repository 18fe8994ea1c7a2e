//! Published price table
//!
//! The single piece of state shared between the stream reader and the
//! dashboard's read path. One writer, many readers, atomic per-key replace.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::symbol::Symbol;

/// One published price tick.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceUpdate {
    pub symbol: Symbol,
    pub price: f64,
}

/// Latest observed price per symbol.
///
/// Entries are only ever inserted or overwritten. Removing a symbol from the
/// subscription set leaves its last price in place, so a position keeps
/// showing its most recent mark instead of flickering back to empty.
#[derive(Clone)]
pub struct PriceTable {
    inner: Arc<DashMap<Symbol, f64>>,
    updates: broadcast::Sender<PriceUpdate>,
}

impl PriceTable {
    pub fn new(buffer_size: usize) -> Self {
        let (updates, _) = broadcast::channel(buffer_size.max(1));
        Self {
            inner: Arc::new(DashMap::new()),
            updates,
        }
    }

    /// Set or overwrite the entry for a symbol and notify subscribers.
    /// A reader calling [`get`](Self::get) immediately afterwards observes
    /// the new value.
    pub fn publish(&self, symbol: Symbol, price: f64) {
        self.inner.insert(symbol.clone(), price);
        // No subscribers is fine; the table itself is the source of truth.
        let _ = self.updates.send(PriceUpdate { symbol, price });
    }

    pub fn get(&self, symbol: &Symbol) -> Option<f64> {
        self.inner.get(symbol).map(|price| *price)
    }

    pub fn snapshot(&self) -> HashMap<Symbol, f64> {
        self.inner
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PriceUpdate> {
        self.updates.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_is_visible_immediately() {
        let table = PriceTable::new(16);
        let btc = Symbol::new("BTC/USDT");

        table.publish(btc.clone(), 67123.45);
        assert_eq!(table.get(&btc), Some(67123.45));

        table.publish(btc.clone(), 67200.0);
        assert_eq!(table.get(&btc), Some(67200.0));
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn subscribers_receive_updates() {
        let table = PriceTable::new(16);
        let mut updates = table.subscribe();

        table.publish(Symbol::new("ETH"), 3300.5);

        let update = updates.try_recv().expect("update should be buffered");
        assert_eq!(update.symbol, Symbol::new("ETH"));
        assert_eq!(update.price, 3300.5);
    }

    #[test]
    fn entries_accumulate_across_symbols() {
        let table = PriceTable::new(16);
        table.publish(Symbol::new("BTC/USDT"), 67000.0);
        table.publish(Symbol::new("ETH"), 3300.0);

        let snapshot = table.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&Symbol::new("BTC/USDT")], 67000.0);
        assert_eq!(snapshot[&Symbol::new("ETH")], 3300.0);
    }
}

//! Trade store interface and in-memory implementation

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::{LedgerError, LedgerResult, LedgerStats, NewTrade, Trade, TradePatch, TradeStatus};

/// Persisted-record store for trades. The dashboard derives its
/// subscription set from `list_trades` and its header statistics from
/// `stats`.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn list_trades(&self) -> LedgerResult<Vec<Trade>>;
    async fn create_trade(&self, new: NewTrade) -> LedgerResult<Trade>;
    async fn update_trade(&self, id: Uuid, patch: TradePatch) -> LedgerResult<Trade>;
    async fn delete_trade(&self, id: Uuid) -> LedgerResult<()>;
    async fn stats(&self) -> LedgerResult<LedgerStats>;
}

/// In-memory ledger used by the demo binary and tests.
#[derive(Default)]
pub struct InMemoryTradeStore {
    trades: DashMap<Uuid, Trade>,
}

impl InMemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TradeStore for InMemoryTradeStore {
    /// Trades ordered newest first.
    async fn list_trades(&self) -> LedgerResult<Vec<Trade>> {
        let mut trades: Vec<Trade> = self.trades.iter().map(|entry| entry.value().clone()).collect();
        trades.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trades)
    }

    async fn create_trade(&self, new: NewTrade) -> LedgerResult<Trade> {
        new.validate()?;
        let trade = Trade {
            id: Uuid::new_v4(),
            symbol: new.symbol,
            direction: new.direction,
            entry_low: new.entry_low,
            entry_high: new.entry_high,
            take_profits: new.take_profits,
            stop_loss: new.stop_loss,
            status: TradeStatus::Open,
            created_at: Utc::now(),
            closed_at: None,
            pnl: None,
            notes: new.notes,
        };
        self.trades.insert(trade.id, trade.clone());
        Ok(trade)
    }

    async fn update_trade(&self, id: Uuid, patch: TradePatch) -> LedgerResult<Trade> {
        let mut entry = self.trades.get_mut(&id).ok_or(LedgerError::NotFound(id))?;
        let trade = entry.value_mut();
        if let Some(status) = patch.status {
            trade.status = status;
            if status != TradeStatus::Open && trade.closed_at.is_none() {
                trade.closed_at = Some(Utc::now());
            }
        }
        if let Some(pnl) = patch.pnl {
            trade.pnl = Some(pnl);
        }
        if let Some(notes) = patch.notes {
            trade.notes = Some(notes);
        }
        Ok(trade.clone())
    }

    async fn delete_trade(&self, id: Uuid) -> LedgerResult<()> {
        self.trades
            .remove(&id)
            .map(|_| ())
            .ok_or(LedgerError::NotFound(id))
    }

    async fn stats(&self) -> LedgerResult<LedgerStats> {
        let mut stats = LedgerStats::default();
        for entry in self.trades.iter() {
            let trade = entry.value();
            stats.total += 1;
            match trade.status {
                TradeStatus::Success => stats.wins += 1,
                TradeStatus::Failed => stats.losses += 1,
                TradeStatus::Open | TradeStatus::Partial => {}
            }
            stats.total_pnl += trade.pnl.unwrap_or(0.0);
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Symbol;

    #[tokio::test]
    async fn create_list_update_delete_round_trip() {
        let store = InMemoryTradeStore::new();

        let created = store
            .create_trade(NewTrade::long(Symbol::new("BTC/USDT"), 100.0, 110.0, 90.0))
            .await
            .unwrap();
        assert_eq!(created.status, TradeStatus::Open);
        assert!(created.closed_at.is_none());

        let listed = store.list_trades().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);

        let closed = store
            .update_trade(created.id, TradePatch::close(TradeStatus::Success, 10.0))
            .await
            .unwrap();
        assert_eq!(closed.status, TradeStatus::Success);
        assert_eq!(closed.pnl, Some(10.0));
        assert!(closed.closed_at.is_some());

        store.delete_trade(created.id).await.unwrap();
        assert!(store.list_trades().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_fail_with_not_found() {
        let store = InMemoryTradeStore::new();
        let id = Uuid::new_v4();

        assert!(matches!(
            store.update_trade(id, TradePatch::default()).await,
            Err(LedgerError::NotFound(missing)) if missing == id
        ));
        assert!(matches!(
            store.delete_trade(id).await,
            Err(LedgerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_trades_are_rejected() {
        let store = InMemoryTradeStore::new();
        let result = store
            .create_trade(NewTrade::short(Symbol::new("ETH"), 110.0, 100.0, 120.0))
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidTrade { .. })));
        assert!(store.list_trades().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_aggregate_wins_losses_and_pnl() {
        let store = InMemoryTradeStore::new();

        let win = store
            .create_trade(NewTrade::long(Symbol::new("BTC/USDT"), 100.0, 100.0, 90.0))
            .await
            .unwrap();
        let loss = store
            .create_trade(NewTrade::short(Symbol::new("ETH"), 3300.0, 3400.0, 3500.0))
            .await
            .unwrap();
        store
            .create_trade(NewTrade::long(Symbol::new("SOL"), 150.0, 155.0, 140.0))
            .await
            .unwrap();

        store
            .update_trade(win.id, TradePatch::close(TradeStatus::Success, 12.5))
            .await
            .unwrap();
        store
            .update_trade(loss.id, TradePatch::close(TradeStatus::Failed, -4.0))
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 1);
        assert!((stats.total_pnl - 8.5).abs() < 1e-9);
    }
}

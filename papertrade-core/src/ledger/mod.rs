//! Trade ledger
//!
//! The persisted-record collaborator the dashboard is built around: recorded
//! hypothetical trades, their win/loss statistics, and the PnL arithmetic
//! that marks open positions against the live price table.

mod store;

pub use store::{InMemoryTradeStore, TradeStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::feed::Symbol;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors surfaced by the trade store.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("trade not found: {0}")]
    NotFound(Uuid),

    #[error("invalid trade: {reason}")]
    InvalidTrade { reason: String },
}

/// Trade direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

/// Lifecycle status of a recorded trade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Success,
    Failed,
    Partial,
}

/// One recorded trade.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub symbol: Symbol,
    pub direction: Direction,
    pub entry_low: f64,
    pub entry_high: f64,
    pub take_profits: Vec<f64>,
    pub stop_loss: f64,
    pub status: TradeStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub pnl: Option<f64>,
    pub notes: Option<String>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Midpoint of the entry range, the reference price for PnL.
    pub fn entry_mid(&self) -> f64 {
        (self.entry_low + self.entry_high) / 2.0
    }

    /// Unrealized profit/loss in percent against a live price.
    pub fn unrealized_pnl_pct(&self, live_price: f64) -> f64 {
        let entry = self.entry_mid();
        let diff = match self.direction {
            Direction::Long => live_price - entry,
            Direction::Short => entry - live_price,
        };
        diff / entry * 100.0
    }
}

/// Fields supplied when opening a position.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewTrade {
    pub symbol: Symbol,
    pub direction: Direction,
    pub entry_low: f64,
    pub entry_high: f64,
    #[serde(default)]
    pub take_profits: Vec<f64>,
    pub stop_loss: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewTrade {
    pub fn long(symbol: Symbol, entry_low: f64, entry_high: f64, stop_loss: f64) -> Self {
        Self {
            symbol,
            direction: Direction::Long,
            entry_low,
            entry_high,
            take_profits: Vec::new(),
            stop_loss,
            notes: None,
        }
    }

    pub fn short(symbol: Symbol, entry_low: f64, entry_high: f64, stop_loss: f64) -> Self {
        Self {
            symbol,
            direction: Direction::Short,
            entry_low,
            entry_high,
            take_profits: Vec::new(),
            stop_loss,
            notes: None,
        }
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.symbol.as_str().trim().is_empty() {
            return Err(LedgerError::InvalidTrade {
                reason: "symbol must not be empty".to_string(),
            });
        }
        if self.entry_low <= 0.0 || self.entry_high <= 0.0 {
            return Err(LedgerError::InvalidTrade {
                reason: "entry prices must be positive".to_string(),
            });
        }
        if self.entry_low > self.entry_high {
            return Err(LedgerError::InvalidTrade {
                reason: "entry range is inverted".to_string(),
            });
        }
        if self.stop_loss <= 0.0 {
            return Err(LedgerError::InvalidTrade {
                reason: "stop loss must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Partial update applied to an existing trade.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TradePatch {
    pub status: Option<TradeStatus>,
    pub pnl: Option<f64>,
    pub notes: Option<String>,
}

impl TradePatch {
    /// Close a trade with its final status and realized PnL.
    pub fn close(status: TradeStatus, pnl: f64) -> Self {
        Self {
            status: Some(status),
            pnl: Some(pnl),
            notes: None,
        }
    }
}

/// Aggregated win/loss performance across the ledger.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub total_pnl: f64,
}

impl LedgerStats {
    pub fn win_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.wins as f64 / self.total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_trade(direction: Direction, entry_low: f64, entry_high: f64) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            symbol: Symbol::new("BTC/USDT"),
            direction,
            entry_low,
            entry_high,
            take_profits: vec![],
            stop_loss: 1.0,
            status: TradeStatus::Open,
            created_at: Utc::now(),
            closed_at: None,
            pnl: None,
            notes: None,
        }
    }

    #[test]
    fn long_pnl_tracks_price_above_entry() {
        let trade = open_trade(Direction::Long, 100.0, 100.0);
        assert_eq!(trade.unrealized_pnl_pct(110.0), 10.0);
        assert_eq!(trade.unrealized_pnl_pct(90.0), -10.0);
    }

    #[test]
    fn short_pnl_tracks_price_below_entry() {
        let trade = open_trade(Direction::Short, 100.0, 100.0);
        assert_eq!(trade.unrealized_pnl_pct(90.0), 10.0);
        assert_eq!(trade.unrealized_pnl_pct(110.0), -10.0);
    }

    #[test]
    fn pnl_uses_entry_range_midpoint() {
        let trade = open_trade(Direction::Long, 100.0, 110.0);
        assert_eq!(trade.entry_mid(), 105.0);
        assert!((trade.unrealized_pnl_pct(115.5) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn validation_rejects_bad_ranges() {
        let mut new = NewTrade::long(Symbol::new("BTC/USDT"), 100.0, 110.0, 90.0);
        assert!(new.validate().is_ok());

        new.entry_low = 120.0;
        assert!(matches!(
            new.validate(),
            Err(LedgerError::InvalidTrade { .. })
        ));

        let empty = NewTrade::short(Symbol::new("  "), 100.0, 110.0, 120.0);
        assert!(matches!(
            empty.validate(),
            Err(LedgerError::InvalidTrade { .. })
        ));

        let free_stop = NewTrade::long(Symbol::new("ETH"), 100.0, 110.0, 0.0);
        assert!(matches!(
            free_stop.validate(),
            Err(LedgerError::InvalidTrade { .. })
        ));
    }

    #[test]
    fn win_rate_handles_empty_ledger() {
        assert_eq!(LedgerStats::default().win_rate(), 0.0);
        let stats = LedgerStats {
            total: 4,
            wins: 3,
            losses: 1,
            total_pnl: 12.5,
        };
        assert_eq!(stats.win_rate(), 75.0);
    }

    #[test]
    fn trade_serializes_with_ledger_field_names() {
        let trade = open_trade(Direction::Long, 100.0, 110.0);
        let json = serde_json::to_value(&trade).unwrap();
        assert_eq!(json["direction"], "LONG");
        assert_eq!(json["status"], "open");
        assert!(json.get("entry_low").is_some());
        assert!(json.get("take_profits").is_some());
    }
}

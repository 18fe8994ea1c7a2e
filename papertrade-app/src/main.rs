//! Paper-Trading Dashboard
//!
//! Demo binary: seeds an in-memory trade ledger, keeps the live price feed
//! subscribed to the ledger's symbols, and reports unrealized PnL per
//! position on a fixed refresh cycle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use papertrade_core::{
    Dashboard, FeedConfig, InMemoryTradeStore, NewTrade, Symbol, TradeStore,
};
use tokio::signal;
use tokio::time::interval;
use tracing::{debug, info};

const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("starting paper-trading dashboard");

    let store = Arc::new(InMemoryTradeStore::new());
    seed_demo_trades(store.as_ref()).await?;

    let dashboard = Dashboard::new(store, FeedConfig::default());
    dashboard.prime_prices().await?;
    dashboard.sync_feed().await?;

    // Trace every tick; the report loop below stays readable at info level.
    let mut updates = dashboard.subscribe_updates();
    tokio::spawn(async move {
        while let Ok(update) = updates.recv().await {
            debug!(symbol = %update.symbol, price = update.price, "price update");
        }
    });

    let mut refresh = interval(REFRESH_INTERVAL);
    loop {
        tokio::select! {
            _ = refresh.tick() => {
                dashboard.sync_feed().await?;
                report(&dashboard).await?;
            }
            _ = signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    dashboard.shutdown();

    let stats = dashboard.stats().await?;
    info!(
        total = stats.total,
        wins = stats.wins,
        losses = stats.losses,
        total_pnl_pct = stats.total_pnl,
        win_rate_pct = stats.win_rate(),
        "final ledger statistics"
    );
    Ok(())
}

async fn seed_demo_trades(store: &dyn TradeStore) -> Result<()> {
    store
        .create_trade(NewTrade::long(
            Symbol::new("BTC/USDT"),
            66500.0,
            67500.0,
            63000.0,
        ))
        .await?;

    let mut eth_short = NewTrade::short(Symbol::new("ETH"), 3350.0, 3400.0, 3520.0);
    eth_short.take_profits = vec![3200.0, 3050.0];
    eth_short.notes = Some("demo position".to_string());
    store.create_trade(eth_short).await?;

    Ok(())
}

async fn report(dashboard: &Dashboard) -> Result<()> {
    for (trade, pnl) in dashboard.positions_with_pnl().await? {
        match pnl {
            Some(pnl) => info!(
                symbol = %trade.symbol,
                direction = ?trade.direction,
                status = ?trade.status,
                pnl_pct = pnl,
                "position"
            ),
            None => info!(
                symbol = %trade.symbol,
                direction = ?trade.direction,
                "position awaiting first price"
            ),
        }
    }
    Ok(())
}

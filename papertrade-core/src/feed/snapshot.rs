//! REST price snapshot
//!
//! Primes the price table so positions show a mark before the stream
//! delivers its first trade tick. The stream remains the source of truth
//! once connected.

use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use super::error::{FeedError, FeedResult};
use super::symbol::{pair_code, Symbol};

/// Spot price entry as returned by `/api/v3/ticker/price`.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    pub price: String,
}

/// Fetch the current spot price for one symbol.
pub async fn fetch_spot_price(
    client: &Client,
    rest_endpoint: &str,
    symbol: &Symbol,
) -> FeedResult<f64> {
    let pair = pair_code(symbol).to_uppercase();
    let ticker: TickerPrice = client
        .get(format!("{rest_endpoint}/api/v3/ticker/price"))
        .query(&[("symbol", pair.as_str())])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let price: f64 = ticker
        .price
        .parse()
        .map_err(|_| FeedError::Parse(format!("unparseable snapshot price: {}", ticker.price)))?;
    if !price.is_finite() || price <= 0.0 {
        return Err(FeedError::Parse(format!(
            "non-positive snapshot price: {price}"
        )));
    }
    Ok(price)
}

/// Fetch spot prices for every symbol, skipping the ones that fail.
/// Per-symbol failures are logged and never abort the caller.
pub async fn fetch_spot_prices(
    client: &Client,
    rest_endpoint: &str,
    symbols: &[Symbol],
) -> Vec<(Symbol, f64)> {
    let mut prices = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match fetch_spot_price(client, rest_endpoint, symbol).await {
            Ok(price) => prices.push((symbol.clone(), price)),
            Err(err) => warn!(%symbol, error = %err, "price snapshot failed"),
        }
    }
    prices
}

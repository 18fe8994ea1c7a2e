//! Frame demultiplexing
//!
//! The combined stream interleaves trade events for every subscribed pair.
//! Each frame is decoded, mapped back to the originating symbol, and turned
//! into a price update; anything unusable is dropped without disturbing the
//! connection.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::symbol::{match_wire_symbol, Symbol};

/// Trade payload carried in the `data` field of a stream frame.
#[derive(Debug, Clone, Deserialize)]
struct TradeEvent {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    price: String,
}

/// Outcome of demultiplexing one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// A usable tick for a subscribed symbol.
    Price(Symbol, f64),
    /// Recognized but unusable: control/heartbeat shape, or a wire symbol
    /// with no subscribed counterpart.
    Ignored,
    /// Unparseable frame or unparseable price; logged and dropped.
    Malformed,
}

/// Decode a frame and resolve it against the connection's subscription set.
///
/// Accepts both the combined-stream envelope `{"stream": ..., "data": {...}}`
/// and a bare event object, which is what single-stream endpoints deliver.
pub fn demux_frame(text: &str, candidates: &[Symbol]) -> FrameOutcome {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "discarding malformed frame");
            return FrameOutcome::Malformed;
        }
    };

    let event = value.get("data").unwrap_or(&value);
    let event: TradeEvent = match serde_json::from_value(event.clone()) {
        Ok(event) => event,
        Err(_) => {
            debug!("frame without trade payload, ignoring");
            return FrameOutcome::Ignored;
        }
    };

    let price: f64 = match event.price.parse() {
        Ok(price) => price,
        Err(_) => {
            warn!(price = %event.price, "discarding frame with unparseable price");
            return FrameOutcome::Malformed;
        }
    };
    if !price.is_finite() || price <= 0.0 {
        warn!(price, "discarding frame with non-positive price");
        return FrameOutcome::Malformed;
    }

    match match_wire_symbol(&event.symbol, candidates) {
        Some(symbol) => FrameOutcome::Price(symbol.clone(), price),
        None => {
            debug!(wire = %event.symbol, "no subscribed symbol for frame, ignoring");
            FrameOutcome::Ignored
        }
    }
}

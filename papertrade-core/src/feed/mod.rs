//! Live price feed subsystem
//!
//! Symbol normalization, the stream connection lifecycle, frame
//! demultiplexing, and the published price table.

pub mod connection;
pub mod demux;
pub mod error;
pub mod publisher;
pub mod snapshot;
pub mod symbol;

pub use connection::{FeedConfig, FeedMetrics, FeedStatus, LiveFeed};
pub use demux::{demux_frame, FrameOutcome};
pub use error::{FeedError, FeedResult};
pub use publisher::{PriceTable, PriceUpdate};
pub use snapshot::{fetch_spot_price, fetch_spot_prices, TickerPrice};
pub use symbol::{
    canonical_topic_key, match_wire_symbol, pair_code, stream_name, Symbol, DEFAULT_QUOTE,
    TRADE_STREAM,
};

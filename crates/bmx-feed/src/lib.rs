//! Feed-state normalization for the BitMEX derivatives client.
//!
//! The streaming transport (WebSocket framing, reconnects, heartbeats)
//! lives outside this crate; it is abstracted as a [`FeedCache`] of keyed
//! table snapshots. This crate turns those raw, unordered snapshots into
//! sorted, typed domain views safe for a trading loop to consume every
//! cycle.

pub mod cache;
pub mod error;
pub mod normalize;
pub mod raw;

pub use cache::{FeedCache, FeedTable, MemoryFeedCache};
pub use error::{FeedError, FeedResult};

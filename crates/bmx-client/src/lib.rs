//! Unified client facade for the BitMEX derivatives exchange.
//!
//! Composes the authenticated REST path (`bmx-rest`) with normalized
//! feed-state views (`bmx-feed`) behind one API surface. A trading loop
//! reads sorted books, trades, open orders, and balances from the feed
//! side every cycle, and manages orders through the REST side.

pub mod client;
pub mod config;
pub mod error;

pub use client::BitmexClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};

// Filter builders for historical queries.
pub use bmx_rest::filter::{daily_filter, hourly_filter, minutely_filter, time_range_filter};

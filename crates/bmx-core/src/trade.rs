//! Public trade records.

use crate::order::OrderSide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single public trade, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Exchange-assigned match identifier, unique per trade.
    pub match_id: String,
    pub timestamp: DateTime<Utc>,
    pub side: OrderSide,
    pub price: f64,
    pub size: i64,
}

impl Trade {
    pub fn new(
        match_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        side: OrderSide,
        price: f64,
        size: i64,
    ) -> Self {
        Self {
            match_id: match_id.into(),
            timestamp,
            side,
            price,
            size,
        }
    }

    /// Signed size: `+size` for buys, `-size` for sells.
    ///
    /// Summing momentum across a window gives net buy/sell pressure.
    pub fn momentum(&self) -> i64 {
        self.side.sign() * self.size
    }

    /// Canonical ordering key: `(timestamp, match_id)` ascending.
    pub fn sort_key(&self) -> (DateTime<Utc>, &str) {
        (self.timestamp, &self.match_id)
    }
}

//! Order book levels.

use serde::{Deserialize, Serialize};

/// A pruned order book level: price and resting size only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: i64,
}

impl BookLevel {
    pub fn new(price: f64, size: i64) -> Self {
        Self { price, size }
    }
}

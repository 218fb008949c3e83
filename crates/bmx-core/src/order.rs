//! Order-related types and identifiers.
//!
//! Serde representations match the exchange wire format exactly
//! (`"Buy"`/`"Sell"`, `"ParticipateDoNotInitiate"`, etc.), so these
//! types can be used directly in request payloads and feed records.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Returns 1 for buy, -1 for sell (for signed-size calculations).
    pub fn sign(&self) -> i64 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Sell => write!(f, "Sell"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
    Stop,
    StopLimit,
}

/// Execution instruction attached to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecInst {
    /// Post-only: reject the order instead of taking liquidity.
    ParticipateDoNotInitiate,
    /// Close the current position; quantity is capped to the position size.
    Close,
}

/// Time-in-force for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    #[default]
    GoodTillCancel,
    ImmediateOrCancel,
    FillOrKill,
}

/// Client order ID carried on submitted orders.
///
/// Generated IDs embed the configured prefix so the feed side can
/// filter the open-orders table down to orders this client owns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Generate a new unique client order ID.
    ///
    /// Format: `{prefix}{base64(uuid4 bytes)}` with base64 padding stripped.
    pub fn generate(prefix: &str) -> Self {
        let encoded = BASE64.encode(Uuid::new_v4().as_bytes());
        Self(format!("{prefix}{}", encoded.trim_end_matches('=')))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientOrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single working order from the open-orders view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub order_id: String,
    pub client_order_id: String,
    pub side: OrderSide,
    pub quantity: i64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for OpenOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Side: {}; Quantity: {}; Price: {:.1}; OrderID: {}; ClOrdID: {}; Timestamp: {}",
            self.side,
            self.quantity,
            self.price,
            self.order_id,
            self.client_order_id,
            self.timestamp.format("%Y%m%d_%H%M%S"),
        )
    }
}

/// Side-split open orders: bids descending by price, asks ascending.
///
/// A pure value object: every transformation yields a new `OpenOrders`
/// and preserves the relative order of surviving entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenOrders {
    pub bids: Vec<OpenOrder>,
    pub asks: Vec<OpenOrder>,
}

impl OpenOrders {
    pub fn new(bids: Vec<OpenOrder>, asks: Vec<OpenOrder>) -> Self {
        Self { bids, asks }
    }

    /// Remove orders whose `order_id` is in `remove_targets`.
    pub fn remove_orders(&self, remove_targets: &HashSet<String>) -> Self {
        Self {
            bids: self
                .bids
                .iter()
                .filter(|o| !remove_targets.contains(&o.order_id))
                .cloned()
                .collect(),
            asks: self
                .asks
                .iter()
                .filter(|o| !remove_targets.contains(&o.order_id))
                .cloned()
                .collect(),
        }
    }

    /// All orders, bids first.
    pub fn to_vec(&self) -> Vec<OpenOrder> {
        self.bids.iter().chain(self.asks.iter()).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

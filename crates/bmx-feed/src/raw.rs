//! Typed raw feed records.
//!
//! The feed cache hands back untyped JSON rows; these structs pin down
//! the fields the normalizer actually reads. Everything else in a row
//! is ignored, and fields the exchange sometimes omits are `Option`.

use bmx_core::OrderSide;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One `orderBookL2` level.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBookEntry {
    pub side: OrderSide,
    pub price: f64,
    pub size: i64,
}

/// One public `trade` record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrade {
    #[serde(rename = "trdMatchID")]
    pub trd_match_id: String,
    pub timestamp: DateTime<Utc>,
    pub side: OrderSide,
    pub price: f64,
    pub size: i64,
}

/// One working order from the `order` table.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrder {
    #[serde(rename = "orderID")]
    pub order_id: String,
    #[serde(rename = "clOrdID", default)]
    pub cl_ord_id: String,
    pub side: OrderSide,
    pub order_qty: i64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// One `position` record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPosition {
    pub symbol: String,
    #[serde(default)]
    pub current_qty: i64,
}

/// One `margin` record, balances in minor units.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMargin {
    pub withdrawable_margin: i64,
    pub wallet_balance: i64,
}

/// One `instrument` record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstrument {
    pub symbol: String,
    pub state: String,
}

//! Typed REST order payloads.

use bmx_core::{ExecInst, OrderSide, OrderType, TimeInForce};
use serde::Serialize;

/// One order submission payload.
///
/// Absent fields are omitted from the serialized JSON entirely; the
/// exchange treats missing and null differently for several of them.
/// The executor fills in `symbol`, and `cl_ord_id` when not supplied.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<OrderSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_qty: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_px: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_qty: Option<i64>,
    #[serde(rename = "clOrdID", skip_serializing_if = "Option::is_none")]
    pub cl_ord_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ord_type: Option<OrderType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<TimeInForce>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec_inst: Option<ExecInst>,
}

impl NewOrder {
    /// A plain limit order.
    pub fn limit(side: OrderSide, order_qty: i64, price: f64) -> Self {
        Self {
            side: Some(side),
            order_qty: Some(order_qty),
            price: Some(price),
            ord_type: Some(OrderType::Limit),
            ..Self::default()
        }
    }

    /// A market order.
    pub fn market(side: OrderSide, order_qty: i64) -> Self {
        Self {
            side: Some(side),
            order_qty: Some(order_qty),
            ord_type: Some(OrderType::Market),
            ..Self::default()
        }
    }
}

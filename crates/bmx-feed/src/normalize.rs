//! Normalization of raw feed snapshots into sorted domain views.
//!
//! All functions here are pure transformations over table snapshots:
//! no network, no retries, no shared state. Each call builds fresh
//! value objects owned solely by the caller.

use crate::cache::FeedTable;
use crate::error::{FeedError, FeedResult};
use crate::raw::{RawBookEntry, RawInstrument, RawMargin, RawOrder, RawPosition, RawTrade};
use bmx_core::{Balances, BookLevel, OpenOrder, OpenOrders, OrderSide, Trade};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

fn decode_rows<T: DeserializeOwned>(table: FeedTable, rows: &[Value]) -> FeedResult<Vec<T>> {
    rows.iter()
        .map(|row| {
            serde_json::from_value(row.clone()).map_err(|source| FeedError::Decode { table, source })
        })
        .collect()
}

/// Price-ordered book view: bids descending, asks ascending.
///
/// Sorts are stable, so levels at equal prices keep their feed order.
pub fn order_book(rows: &[Value]) -> FeedResult<(Vec<BookLevel>, Vec<BookLevel>)> {
    let entries: Vec<RawBookEntry> = decode_rows(FeedTable::OrderBookL2, rows)?;

    let mut bids = Vec::new();
    let mut asks = Vec::new();
    for entry in entries {
        let level = BookLevel::new(entry.price, entry.size);
        match entry.side {
            OrderSide::Buy => bids.push(level),
            OrderSide::Sell => asks.push(level),
        }
    }
    bids.sort_by(|a, b| b.price.total_cmp(&a.price));
    asks.sort_by(|a, b| a.price.total_cmp(&b.price));

    debug!(bids = bids.len(), asks = asks.len(), "Normalized order book");
    Ok((bids, asks))
}

/// Time-ordered trade view.
///
/// Ascending by `(timestamp, match_id)`; `reverse` flips the whole
/// ordering rather than adding a secondary key.
pub fn recent_trades(rows: &[Value], reverse: bool) -> FeedResult<Vec<Trade>> {
    let raw: Vec<RawTrade> = decode_rows(FeedTable::Trade, rows)?;

    let mut trades: Vec<Trade> = raw
        .into_iter()
        .map(|t| Trade::new(t.trd_match_id, t.timestamp, t.side, t.price, t.size))
        .collect();
    trades.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    if reverse {
        trades.reverse();
    }
    Ok(trades)
}

/// Side-split open-orders view, restricted to orders whose `clOrdID`
/// starts with `cl_ord_id_prefix` (an empty prefix keeps everything).
pub fn open_orders(rows: &[Value], cl_ord_id_prefix: &str) -> FeedResult<OpenOrders> {
    let raw: Vec<RawOrder> = decode_rows(FeedTable::Order, rows)?;

    let mut bids = Vec::new();
    let mut asks = Vec::new();
    for order in raw {
        if !order.cl_ord_id.starts_with(cl_ord_id_prefix) {
            continue;
        }
        let open = OpenOrder {
            order_id: order.order_id,
            client_order_id: order.cl_ord_id,
            side: order.side,
            quantity: order.order_qty,
            price: order.price,
            timestamp: order.timestamp,
        };
        match open.side {
            OrderSide::Buy => bids.push(open),
            OrderSide::Sell => asks.push(open),
        }
    }
    bids.sort_by(|a, b| b.price.total_cmp(&a.price));
    asks.sort_by(|a, b| a.price.total_cmp(&b.price));

    Ok(OpenOrders::new(bids, asks))
}

/// Signed position size for `symbol`, zero when no entry matches.
pub fn position_size(rows: &[Value], symbol: &str) -> FeedResult<i64> {
    let positions: Vec<RawPosition> = decode_rows(FeedTable::Position, rows)?;
    Ok(positions
        .iter()
        .find(|p| p.symbol == symbol)
        .map(|p| p.current_qty)
        .unwrap_or(0))
}

/// Balance view scaled from minor units into major currency units.
pub fn balances(rows: &[Value]) -> FeedResult<Balances> {
    let row = rows.first().ok_or(FeedError::EmptyTable(FeedTable::Margin))?;
    let margin: RawMargin = serde_json::from_value(row.clone()).map_err(|source| {
        FeedError::Decode {
            table: FeedTable::Margin,
            source,
        }
    })?;
    Ok(Balances::from_minor_units(
        margin.withdrawable_margin,
        margin.wallet_balance,
    ))
}

/// Reported state label of the instrument for `symbol`.
pub fn market_state(rows: &[Value], symbol: &str) -> FeedResult<String> {
    if rows.is_empty() {
        return Err(FeedError::EmptyTable(FeedTable::Instrument));
    }
    let instruments: Vec<RawInstrument> = decode_rows(FeedTable::Instrument, rows)?;
    instruments
        .into_iter()
        .find(|i| i.symbol == symbol)
        .map(|i| i.state)
        .ok_or_else(|| FeedError::MissingSymbol {
            table: FeedTable::Instrument,
            symbol: symbol.to_string(),
        })
}

/// A market is in a normal state iff its label is exactly `Open` or
/// `Closed`; anything else (settlement, halt, unlisted) is abnormal.
pub fn is_normal_market_state(state: &str) -> bool {
    state == "Open" || state == "Closed"
}

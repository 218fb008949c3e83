//! Feed cache collaborator interface.
//!
//! A feed cache holds the latest snapshot of each exchange table,
//! continuously updated by a streaming transport outside this crate.
//! The normalizer only ever reads snapshots; it never writes.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;

/// Exchange table names served by the feed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedTable {
    Instrument,
    OrderBookL2,
    Trade,
    Position,
    Order,
    Execution,
    Margin,
}

impl FeedTable {
    /// The exchange-side table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instrument => "instrument",
            Self::OrderBookL2 => "orderBookL2",
            Self::Trade => "trade",
            Self::Position => "position",
            Self::Order => "order",
            Self::Execution => "execution",
            Self::Margin => "margin",
        }
    }
}

impl fmt::Display for FeedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of a live table store.
///
/// Snapshot reads take no locks across tables: a book read and a
/// position read may reflect different feed update instants.
pub trait FeedCache: Send + Sync {
    /// Latest snapshot of a table's rows. Empty when nothing has arrived.
    fn snapshot(&self, table: FeedTable) -> Vec<Value>;

    /// When the table was last written, if ever.
    fn last_update(&self, table: FeedTable) -> Option<DateTime<Utc>>;
}

/// In-memory [`FeedCache`] backed by concurrent maps.
///
/// Embedders that drive their own transport replace whole-table
/// snapshots via [`MemoryFeedCache::replace`]; readers always observe a
/// complete snapshot of a single table.
#[derive(Debug, Default)]
pub struct MemoryFeedCache {
    tables: DashMap<FeedTable, Vec<Value>>,
    updates: DashMap<FeedTable, DateTime<Utc>>,
}

impl MemoryFeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a table's snapshot, stamping the update time.
    pub fn replace(&self, table: FeedTable, rows: Vec<Value>) {
        self.tables.insert(table, rows);
        self.updates.insert(table, Utc::now());
    }

    /// Drop a table's contents and update stamp.
    pub fn clear(&self, table: FeedTable) {
        self.tables.remove(&table);
        self.updates.remove(&table);
    }
}

impl FeedCache for MemoryFeedCache {
    fn snapshot(&self, table: FeedTable) -> Vec<Value> {
        self.tables
            .get(&table)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    fn last_update(&self, table: FeedTable) -> Option<DateTime<Utc>> {
        self.updates.get(&table).map(|ts| *ts)
    }
}

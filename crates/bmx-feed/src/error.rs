//! Error types for bmx-feed.

use crate::cache::FeedTable;
use thiserror::Error;

/// Feed normalization error types.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed table {0} has no data")]
    EmptyTable(FeedTable),

    #[error("Feed table {table} has no record for symbol {symbol}")]
    MissingSymbol { table: FeedTable, symbol: String },

    #[error("Failed to decode {table} record: {source}")]
    Decode {
        table: FeedTable,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for feed operations.
pub type FeedResult<T> = std::result::Result<T, FeedError>;

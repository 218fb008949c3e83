//! Error types for bmx-client.

use bmx_feed::FeedError;
use bmx_rest::RestError;
use thiserror::Error;

/// Facade error types.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Rest(#[from] RestError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("Client is missing a collaborator: {0}")]
    NotConfigured(&'static str),
}

/// Result type alias for facade operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

//! Error type for the REST executor.
//!
//! Every REST failure surfaces as a single [`RestError`] carrying a
//! human-readable message (the raw exchange JSON body when one was
//! received) and a numeric code for programmatic classification.

use thiserror::Error;

/// Pseudo-status for transport failures (timeouts, connection errors).
pub const CODE_TIMEOUT: i64 = 999;

/// Code for failures where no response was obtained at all.
pub const CODE_UNKNOWN: i64 = -1;

/// REST request failure with a classification code.
///
/// Code conventions: negative = unknown/transport-level, >= 999 =
/// timeout-class, 4xx/5xx = the literal HTTP status.
#[derive(Debug, Clone, Error)]
#[error("{message} (code {code})")]
pub struct RestError {
    pub message: String,
    pub code: i64,
}

impl RestError {
    pub fn new(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    /// No response object was obtained at all.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(message, CODE_UNKNOWN)
    }

    pub fn is_unknown(&self) -> bool {
        self.code < 0
    }

    pub fn is_timeout(&self) -> bool {
        self.code >= CODE_TIMEOUT
    }

    pub fn is_4xx(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_5xx(&self) -> bool {
        (500..600).contains(&self.code)
    }
}

/// Result type alias for REST operations.
pub type RestResult<T> = std::result::Result<T, RestError>;

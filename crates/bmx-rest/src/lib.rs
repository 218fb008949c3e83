//! Authenticated REST path for the BitMEX derivatives client.
//!
//! Provides request signing ([`Credential`]), the retrying request
//! executor ([`RestClient`]), typed order payloads, and the filter
//! builders used by historical queries.

pub mod client;
pub mod credential;
pub mod error;
pub mod filter;
pub mod models;

pub use client::{RestClient, RestConfig};
pub use credential::{expires_after, Credential};
pub use error::{RestError, RestResult, CODE_TIMEOUT, CODE_UNKNOWN};
pub use models::NewOrder;

//! Core domain types for the BitMEX derivatives client.
//!
//! This crate provides the value objects shared by the REST and feed
//! sides of the client:
//! - `OrderSide`, `OrderType`, `ExecInst`, `TimeInForce`: wire-exact trading enums
//! - `ClientOrderId`: prefixed, generated client order identifiers
//! - `Trade`, `OpenOrder`, `OpenOrders`, `BookLevel`, `Balances`: normalized views

pub mod account;
pub mod book;
pub mod order;
pub mod trade;

pub use account::{Balances, SATOSHIS_PER_XBT};
pub use book::BookLevel;
pub use order::{ClientOrderId, ExecInst, OpenOrder, OpenOrders, OrderSide, OrderType, TimeInForce};
pub use trade::Trade;

//! Account balance figures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minor units per XBT; the margin feed reports balances in satoshis.
pub const SATOSHIS_PER_XBT: i64 = 100_000_000;

/// Account balances in major currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    /// Margin available for withdrawal.
    pub withdrawable: Decimal,
    /// Total wallet balance.
    pub wallet: Decimal,
}

impl Balances {
    /// Scale raw minor-unit figures into major units.
    pub fn from_minor_units(withdrawable_margin: i64, wallet_balance: i64) -> Self {
        let scale = Decimal::from(SATOSHIS_PER_XBT);
        Self {
            withdrawable: Decimal::from(withdrawable_margin) / scale,
            wallet: Decimal::from(wallet_balance) / scale,
        }
    }
}

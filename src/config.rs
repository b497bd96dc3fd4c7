// 8.0 config.rs: platform settings in one place.

use crate::types::Dollars;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    // Balance granted to every member on joining a circle
    pub starting_balance: Dollars,
    // Liquidity parameter for markets created without an explicit b
    pub default_liquidity: Decimal,
    // Whether SELL orders are accepted at all
    pub allow_sell: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_balance: Dollars::new(dec!(10000.00)),
            default_liquidity: dec!(100),
            allow_sell: true,
        }
    }
}

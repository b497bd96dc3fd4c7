// 4.0: immutable trade records. appended at execution, never mutated or
// deleted; volume and bettor counts are derived from this log.

use crate::types::{Direction, Dollars, MarketId, Shares, Side, Timestamp, TradeId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub market_id: MarketId,
    pub user_id: UserId,
    pub side: Side,
    pub direction: Direction,
    /// Dollars that changed hands: spend for a BUY, proceeds for a SELL.
    pub amount: Dollars,
    /// Share quantity moved on `side`.
    pub shares: Shares,
    /// Price of the traded side immediately before execution.
    pub price_at_trade: Decimal,
    pub executed_at: Timestamp,
}

// 9.2: result types and errors for engine operations. every mutating call
// answers with the authoritative post-trade numbers so callers reconcile
// without re-querying.

use crate::ledger::LedgerError;
use crate::lmsr::LmsrError;
use crate::market::{MarketError, MarketStatus};
use crate::types::{
    CircleId, Direction, Dollars, MarketId, Shares, Side, Timestamp, TradeId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub trade_id: TradeId,
    pub market_id: MarketId,
    pub side: Side,
    pub direction: Direction,
    /// Dollars spent (BUY) or received (SELL).
    pub amount: Dollars,
    pub shares: Shares,
    /// Traded side's price immediately before the order moved it.
    pub price_at_trade: Decimal,
    pub new_price_yes: Decimal,
    pub new_price_no: Decimal,
    pub new_balance: Dollars,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradePreview {
    /// Shares received (BUY) or surrendered (SELL).
    pub shares: Shares,
    /// Dollars the order would move: spend for a BUY, proceeds for a SELL.
    pub amount: Dollars,
    pub price_after_yes: Decimal,
    pub price_after_no: Decimal,
    /// Relative change of the traded side: (after - before) / before.
    pub price_impact: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub market_id: MarketId,
    pub outcome: Side,
    pub holders_paid: usize,
    pub holders_skipped: usize,
    pub total_paid: Dollars,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDetail {
    pub id: MarketId,
    pub circle_id: CircleId,
    pub title: String,
    pub description: String,
    pub creator: UserId,
    pub end_date: Timestamp,
    pub status: MarketStatus,
    pub outcome: Option<Side>,
    pub b: Decimal,
    pub q_yes: Decimal,
    pub q_no: Decimal,
    pub price_yes: Decimal,
    pub price_no: Decimal,
    pub volume_yes: Dollars,
    pub volume_no: Dollars,
    pub total_volume: Dollars,
    pub yes_bettors: usize,
    pub no_bettors: usize,
}

/// One open holding valued at current prices, for portfolio views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingView {
    pub market_id: MarketId,
    pub market_title: String,
    pub circle_id: CircleId,
    pub status: MarketStatus,
    pub yes_shares: Shares,
    pub no_shares: Shares,
    pub price_yes: Decimal,
    pub price_no: Decimal,
    pub market_value: Dollars,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("market {0:?} not found")]
    MarketNotFound(MarketId),

    #[error("market {0:?} is not open for trading")]
    MarketNotOpen(MarketId),

    #[error("order amount must be positive")]
    InvalidAmount,

    #[error("insufficient shares: requested {requested} {side}, held {held}")]
    InsufficientShares {
        side: Side,
        requested: Shares,
        held: Shares,
    },

    #[error("selling shares is not enabled")]
    SellDisabled,

    #[error("only the market creator may resolve it")]
    Unauthorized,

    #[error("market end date must be in the future")]
    InvalidEndDate,

    #[error("liquidity parameter must be positive")]
    InvalidLiquidity,

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("market error: {0}")]
    Market(#[from] MarketError),

    #[error("pricing error: {0}")]
    Pricing(#[from] LmsrError),
}

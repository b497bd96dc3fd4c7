// 9.0: the engine. coordinates order execution, lifecycle transitions,
// resolution payouts, and read-only views over the market arena and ledger.
// serialized per market, concurrent across markets.

mod core;
mod lifecycle;
mod queries;
mod results;
mod trading;

pub use core::Engine;
pub use results::{
    EngineError, HoldingView, MarketDetail, ResolutionReport, TradePreview, TradeReceipt,
};
pub use trading::OrderSize;

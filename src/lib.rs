// circlebet-core: group prediction market engine.
// play-money circles trade binary YES/NO markets priced by an LMSR market
// maker. all pricing is deterministic; shared state mutates only inside
// per-market exclusive sections.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: MarketId, UserId, Side, Direction, Dollars, Shares
//   2.x  lmsr.rs: cost function, prices, budget inversion (log-sum-exp stable)
//   3.x  position.rs: per-user YES/NO holdings, payout and valuation
//   4.x  trade.rs: append-only trade records
//   5.x  market.rs: market record and Open/Closed/Resolved state machine
//   6.x  ledger.rs: circle-scoped balances, non-negative invariant
//   7.x  leaderboard.rs: balance standings with deterministic ties
//   8.x  config.rs: platform constants
//   9.x  engine/: market arena, order execution, lifecycle, queries

pub mod config;
pub mod engine;
pub mod leaderboard;
pub mod ledger;
pub mod lmsr;
pub mod market;
pub mod position;
pub mod trade;
pub mod types;

pub use config::EngineConfig;
pub use engine::{
    Engine, EngineError, HoldingView, MarketDetail, OrderSize, ResolutionReport, TradePreview,
    TradeReceipt,
};
pub use leaderboard::{rank_members, LeaderboardEntry};
pub use ledger::{Ledger, LedgerError, Membership, MembershipSnapshot};
pub use lmsr::LmsrError;
pub use market::{Market, MarketError, MarketStatus};
pub use position::Position;
pub use trade::Trade;
pub use types::*;

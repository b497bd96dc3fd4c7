//! Market record and lifecycle state machine.
//!
//! A market is one binary question inside a circle. The record carries the
//! LMSR state (`b`, `q_yes`, `q_no`) together with its positions table and
//! append-only trade log, so a single exclusive section guards the whole
//! read-modify-write unit during execution and resolution.

use crate::lmsr;
use crate::position::Position;
use crate::trade::Trade;
use crate::types::{CircleId, Dollars, MarketId, Shares, Side, Timestamp, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle status. `Open → Closed → Resolved`, with `Open → Resolved`
/// also legal: closing is advisory and never gates resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStatus {
    /// Accepting orders.
    Open,
    /// Past its end date (or closed explicitly); no orders, not yet settled.
    Closed,
    /// Outcome fixed and payouts applied. Terminal.
    Resolved,
}

impl Default for MarketStatus {
    fn default() -> Self {
        Self::Open
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MarketError {
    #[error("market {0:?} is already resolved")]
    AlreadyResolved(MarketId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub circle_id: CircleId,
    pub title: String,
    pub description: String,
    pub creator: UserId,
    pub end_date: Timestamp,
    /// Liquidity parameter. Positive, fixed at creation.
    pub b: Decimal,
    /// Net shares issued on each side. May go negative; prices stay defined.
    pub q_yes: Decimal,
    pub q_no: Decimal,
    pub status: MarketStatus,
    /// Winning side, set exactly once at resolution.
    pub outcome: Option<Side>,
    /// Cumulative dollars traded per side.
    pub volume_yes: Dollars,
    pub volume_no: Dollars,
    pub created_at: Timestamp,
    pub positions: HashMap<UserId, Position>,
    pub trades: Vec<Trade>,
}

impl Market {
    pub fn new(
        id: MarketId,
        circle_id: CircleId,
        creator: UserId,
        title: String,
        description: String,
        end_date: Timestamp,
        b: Decimal,
        timestamp: Timestamp,
    ) -> Self {
        debug_assert!(b > Decimal::ZERO, "liquidity parameter must be positive");
        Self {
            id,
            circle_id,
            title,
            description,
            creator,
            end_date,
            b,
            q_yes: Decimal::ZERO,
            q_no: Decimal::ZERO,
            status: MarketStatus::Open,
            outcome: None,
            volume_yes: Dollars::zero(),
            volume_no: Dollars::zero(),
            created_at: timestamp,
            positions: HashMap::new(),
            trades: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == MarketStatus::Open
    }

    pub fn is_resolved(&self) -> bool {
        self.status == MarketStatus::Resolved
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.status == MarketStatus::Open && self.end_date < now
    }

    pub fn price_yes(&self) -> Decimal {
        lmsr::price_yes(self.q_yes, self.q_no, self.b)
    }

    pub fn price_no(&self) -> Decimal {
        lmsr::price_no(self.q_yes, self.q_no, self.b)
    }

    pub fn price_of_side(&self, side: Side) -> Decimal {
        lmsr::price_of_side(self.q_yes, self.q_no, self.b, side)
    }

    /// Advisory close. A no-op on anything but an open market.
    pub fn close(&mut self) {
        if self.status == MarketStatus::Open {
            self.status = MarketStatus::Closed;
        }
    }

    /// Fix the outcome. Legal from `Open` or `Closed`; a second resolution
    /// is rejected, not silently ignored.
    pub fn resolve(&mut self, outcome: Side) -> Result<(), MarketError> {
        if self.is_resolved() {
            return Err(MarketError::AlreadyResolved(self.id));
        }
        self.status = MarketStatus::Resolved;
        self.outcome = Some(outcome);
        Ok(())
    }

    pub fn add_inventory(&mut self, side: Side, shares: Shares) {
        match side {
            Side::Yes => self.q_yes += shares.value(),
            Side::No => self.q_no += shares.value(),
        }
    }

    pub fn remove_inventory(&mut self, side: Side, shares: Shares) {
        match side {
            Side::Yes => self.q_yes -= shares.value(),
            Side::No => self.q_no -= shares.value(),
        }
    }

    pub fn position(&self, user: UserId) -> Option<&Position> {
        self.positions.get(&user)
    }

    pub fn position_mut(&mut self, user: UserId, timestamp: Timestamp) -> &mut Position {
        self.positions
            .entry(user)
            .or_insert_with(|| Position::new(timestamp))
    }

    pub fn record_trade(&mut self, trade: Trade) {
        match trade.side {
            Side::Yes => self.volume_yes = self.volume_yes.add(trade.amount),
            Side::No => self.volume_no = self.volume_no.add(trade.amount),
        }
        self.trades.push(trade);
    }

    pub fn total_volume(&self) -> Dollars {
        self.volume_yes.add(self.volume_no)
    }

    /// Distinct traders who have ever traded `side` in this market.
    pub fn bettor_count(&self, side: Side) -> usize {
        let mut seen: Vec<UserId> = self
            .trades
            .iter()
            .filter(|t| t.side == side)
            .map(|t| t.user_id)
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, TradeId};
    use rust_decimal_macros::dec;

    fn test_market() -> Market {
        Market::new(
            MarketId(1),
            CircleId(1),
            UserId(7),
            "Will it rain on Saturday?".to_string(),
            String::new(),
            Timestamp::from_millis(1_000_000),
            dec!(100),
            Timestamp::from_millis(0),
        )
    }

    fn test_trade(user: u64, side: Side, amount: Decimal) -> Trade {
        Trade {
            id: TradeId(1),
            market_id: MarketId(1),
            user_id: UserId(user),
            side,
            direction: Direction::Buy,
            amount: Dollars::new(amount),
            shares: Shares::new(dec!(1)),
            price_at_trade: dec!(0.5),
            executed_at: Timestamp::from_millis(1),
        }
    }

    #[test]
    fn fresh_market_is_open_at_even_odds() {
        let market = test_market();
        assert!(market.is_open());
        assert_eq!(market.price_yes(), dec!(0.5));
        assert_eq!(market.price_no(), dec!(0.5));
    }

    #[test]
    fn close_is_advisory_and_idempotent() {
        let mut market = test_market();
        market.close();
        assert_eq!(market.status, MarketStatus::Closed);
        market.close();
        assert_eq!(market.status, MarketStatus::Closed);
    }

    #[test]
    fn resolve_from_open_skipping_close() {
        let mut market = test_market();
        market.resolve(Side::Yes).unwrap();
        assert!(market.is_resolved());
        assert_eq!(market.outcome, Some(Side::Yes));
    }

    #[test]
    fn double_resolution_rejected() {
        let mut market = test_market();
        market.resolve(Side::No).unwrap();
        let second = market.resolve(Side::Yes);
        assert!(matches!(second, Err(MarketError::AlreadyResolved(_))));
        assert_eq!(market.outcome, Some(Side::No));
    }

    #[test]
    fn resolved_market_does_not_reopen_via_close() {
        let mut market = test_market();
        market.resolve(Side::Yes).unwrap();
        market.close();
        assert!(market.is_resolved());
    }

    #[test]
    fn expiry_only_applies_to_open_markets() {
        let mut market = test_market();
        assert!(market.is_expired(Timestamp::from_millis(2_000_000)));
        assert!(!market.is_expired(Timestamp::from_millis(500)));

        market.close();
        assert!(!market.is_expired(Timestamp::from_millis(2_000_000)));
    }

    #[test]
    fn volume_accumulates_per_side() {
        let mut market = test_market();
        market.record_trade(test_trade(1, Side::Yes, dec!(50)));
        market.record_trade(test_trade(2, Side::Yes, dec!(25)));
        market.record_trade(test_trade(1, Side::No, dec!(10)));

        assert_eq!(market.volume_yes.value(), dec!(75));
        assert_eq!(market.volume_no.value(), dec!(10));
        assert_eq!(market.total_volume().value(), dec!(85));
    }

    #[test]
    fn bettor_count_is_distinct_users() {
        let mut market = test_market();
        market.record_trade(test_trade(1, Side::Yes, dec!(10)));
        market.record_trade(test_trade(1, Side::Yes, dec!(10)));
        market.record_trade(test_trade(2, Side::Yes, dec!(10)));
        market.record_trade(test_trade(3, Side::No, dec!(10)));

        assert_eq!(market.bettor_count(Side::Yes), 2);
        assert_eq!(market.bettor_count(Side::No), 1);
    }

    #[test]
    fn inventory_moves_by_side() {
        let mut market = test_market();
        market.add_inventory(Side::Yes, Shares::new(dec!(80)));
        market.remove_inventory(Side::Yes, Shares::new(dec!(30)));
        market.add_inventory(Side::No, Shares::new(dec!(5)));

        assert_eq!(market.q_yes, dec!(50));
        assert_eq!(market.q_no, dec!(5));
    }
}

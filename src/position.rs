// 3.0: per-user holdings in one market. YES and NO shares are tracked
// separately and never go negative: selling is capped by what is held.

use crate::types::{Dollars, Shares, Side, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub yes_shares: Shares,
    pub no_shares: Shares,
    pub opened_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Position {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            yes_shares: Shares::zero(),
            no_shares: Shares::zero(),
            opened_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn shares(&self, side: Side) -> Shares {
        match side {
            Side::Yes => self.yes_shares,
            Side::No => self.no_shares,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.yes_shares.is_zero() && self.no_shares.is_zero()
    }

    pub fn add_shares(&mut self, side: Side, delta: Shares, timestamp: Timestamp) {
        let held = self.shares(side).add(delta);
        self.set_shares(side, held);
        self.updated_at = timestamp;
    }

    // caller must have verified delta <= held
    pub fn remove_shares(&mut self, side: Side, delta: Shares, timestamp: Timestamp) {
        debug_assert!(delta <= self.shares(side), "removal exceeds holdings");
        let held = self.shares(side).sub(delta);
        self.set_shares(side, held);
        self.updated_at = timestamp;
    }

    fn set_shares(&mut self, side: Side, shares: Shares) {
        match side {
            Side::Yes => self.yes_shares = shares,
            Side::No => self.no_shares = shares,
        }
    }

    // 3.1: settlement value. winning side converts at $1.00, losing side at $0.
    pub fn payout(&self, outcome: Side) -> Dollars {
        Dollars::new(self.shares(outcome).value())
    }

    // 3.2: mark-to-market value at current prices, for portfolio views
    pub fn market_value(&self, price_yes: Decimal, price_no: Decimal) -> Dollars {
        Dollars::new(self.yes_shares.value() * price_yes + self.no_shares.value() * price_no)
    }

    pub fn zero_out(&mut self, timestamp: Timestamp) {
        self.yes_shares = Shares::zero();
        self.no_shares = Shares::zero();
        self.updated_at = timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn holding(yes: Decimal, no: Decimal) -> Position {
        let mut p = Position::new(Timestamp::from_millis(0));
        p.add_shares(Side::Yes, Shares::new(yes), Timestamp::from_millis(0));
        p.add_shares(Side::No, Shares::new(no), Timestamp::from_millis(0));
        p
    }

    #[test]
    fn payout_counts_only_winning_side() {
        let pos = holding(dec!(10), dec!(5));
        assert_eq!(pos.payout(Side::Yes).value(), dec!(10));
        assert_eq!(pos.payout(Side::No).value(), dec!(5));
    }

    #[test]
    fn add_then_remove_returns_to_flat() {
        let mut pos = Position::new(Timestamp::from_millis(0));
        pos.add_shares(Side::No, Shares::new(dec!(12.5)), Timestamp::from_millis(1));
        assert!(!pos.is_flat());

        pos.remove_shares(Side::No, Shares::new(dec!(12.5)), Timestamp::from_millis(2));
        assert!(pos.is_flat());
        assert_eq!(pos.updated_at, Timestamp::from_millis(2));
    }

    #[test]
    fn market_value_weights_both_sides() {
        let pos = holding(dec!(10), dec!(20));
        let value = pos.market_value(dec!(0.7), dec!(0.3));
        assert_eq!(value.value(), dec!(13)); // 10*0.7 + 20*0.3
    }

    #[test]
    fn zero_out_clears_both_sides() {
        let mut pos = holding(dec!(3), dec!(4));
        pos.zero_out(Timestamp::from_millis(5));
        assert!(pos.is_flat());
    }
}

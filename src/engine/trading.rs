//! Order validation and execution.
//!
//! Execution holds the target market's mutex across the whole
//! {read inventory → price → write inventory + balance + position + trade}
//! sequence, so two orders on the same market can never interleave their
//! read-modify-write. Every fallible step runs before the first mutation;
//! a rejected order leaves all state exactly as it found it.

use super::core::Engine;
use super::results::{EngineError, TradePreview, TradeReceipt};
use crate::lmsr;
use crate::trade::Trade;
use crate::types::{Direction, Dollars, MarketId, Shares, Side, Timestamp, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// How an order is denominated. BUY orders may name a dollar budget (the
/// engine solves for shares) or an exact share count (charged at the quoted
/// cost); SELL orders are always share-denominated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSize {
    Spend(Dollars),
    Shares(Shares),
}

impl Engine {
    /// Read-only order preview. Copies a snapshot of the market under its
    /// lock, releases it, and prices the hypothetical order. Safe to call
    /// concurrently with in-flight executions, which it never observes
    /// half-applied.
    pub fn preview_trade(
        &self,
        market_id: MarketId,
        side: Side,
        direction: Direction,
        size: OrderSize,
    ) -> Result<TradePreview, EngineError> {
        let cell = self.market(market_id)?;
        let (q_yes, q_no, b) = {
            let market = cell.lock();
            (market.q_yes, market.q_no, market.b)
        };

        let price_before = lmsr::price_of_side(q_yes, q_no, b, side);
        let (shares, amount, delta) = size_order(q_yes, q_no, b, side, direction, size)?;

        let (after_yes, after_no) = match side {
            Side::Yes => (q_yes + delta, q_no),
            Side::No => (q_yes, q_no + delta),
        };
        let price_after_yes = lmsr::price_yes(after_yes, after_no, b);
        let price_after_no = Decimal::ONE - price_after_yes;

        let price_after = match side {
            Side::Yes => price_after_yes,
            Side::No => price_after_no,
        };
        let price_impact = if price_before.is_zero() {
            Decimal::ZERO
        } else {
            (price_after - price_before) / price_before
        };

        Ok(TradePreview {
            shares,
            amount,
            price_after_yes,
            price_after_no,
            price_impact,
        })
    }

    /// Validate and atomically apply one order.
    pub fn execute_trade(
        &self,
        market_id: MarketId,
        user: UserId,
        side: Side,
        direction: Direction,
        size: OrderSize,
    ) -> Result<TradeReceipt, EngineError> {
        let cell = self.market(market_id)?;
        let mut market = cell.lock();

        if !market.is_open() {
            return Err(EngineError::MarketNotOpen(market_id));
        }
        if direction == Direction::Sell && !self.config.allow_sell {
            return Err(EngineError::SellDisabled);
        }

        let membership = self.ledger.membership(market.circle_id, user)?;

        // sized against the current inventory, under the lock, never a
        // stale preview
        let price_before = market.price_of_side(side);
        let (shares, amount, _) =
            size_order(market.q_yes, market.q_no, market.b, side, direction, size)?;

        if direction == Direction::Sell {
            let held = market
                .position(user)
                .map(|p| p.shares(side))
                .unwrap_or_else(Shares::zero);
            if shares > held {
                return Err(EngineError::InsufficientShares {
                    side,
                    requested: shares,
                    held,
                });
            }
        }

        let mut member = membership.lock();

        // last fallible step: a failed debit commits nothing
        match direction {
            Direction::Buy => member.debit(amount)?,
            Direction::Sell => member.credit(amount),
        }

        let now = Timestamp::now();
        match direction {
            Direction::Buy => {
                market.add_inventory(side, shares);
                market.position_mut(user, now).add_shares(side, shares, now);
            }
            Direction::Sell => {
                market.remove_inventory(side, shares);
                market
                    .position_mut(user, now)
                    .remove_shares(side, shares, now);
            }
        }

        let trade_id = self.next_trade_id();
        market.record_trade(Trade {
            id: trade_id,
            market_id,
            user_id: user,
            side,
            direction,
            amount,
            shares,
            price_at_trade: price_before,
            executed_at: now,
        });

        let new_price_yes = market.price_yes();
        let new_price_no = Decimal::ONE - new_price_yes;
        let new_balance = member.balance;

        debug!(
            market = market_id.0,
            user = user.0,
            %side,
            %direction,
            %shares,
            %amount,
            "trade executed"
        );

        Ok(TradeReceipt {
            trade_id,
            market_id,
            side,
            direction,
            amount,
            shares,
            price_at_trade: price_before,
            new_price_yes,
            new_price_no,
            new_balance,
        })
    }
}

// resolves an order to (shares moved, dollars moved, signed inventory delta).
// amounts are positive magnitudes; the delta carries the sign.
fn size_order(
    q_yes: Decimal,
    q_no: Decimal,
    b: Decimal,
    side: Side,
    direction: Direction,
    size: OrderSize,
) -> Result<(Shares, Dollars, Decimal), EngineError> {
    match (direction, size) {
        (Direction::Buy, OrderSize::Spend(budget)) => {
            if !budget.is_positive() {
                return Err(EngineError::InvalidAmount);
            }
            let shares =
                lmsr::shares_for_budget(q_yes, q_no, b, side, budget).map_err(|e| {
                    // engine fault or pathological input, not a user error
                    error!(budget = %budget, %side, error = %e, "cost inversion failed");
                    EngineError::Pricing(e)
                })?;
            Ok((shares, budget, shares.value()))
        }
        (Direction::Buy, OrderSize::Shares(shares)) => {
            if !shares.is_positive() {
                return Err(EngineError::InvalidAmount);
            }
            let cost = lmsr::cost_of_shares(q_yes, q_no, b, side, shares.value());
            Ok((shares, cost, shares.value()))
        }
        (Direction::Sell, OrderSize::Shares(shares)) => {
            if !shares.is_positive() {
                return Err(EngineError::InvalidAmount);
            }
            // proceeds: the cost decrease from walking inventory back down
            let proceeds = lmsr::cost_of_shares(q_yes, q_no, b, side, -shares.value()).abs();
            Ok((shares, proceeds, -shares.value()))
        }
        // a dollar-denominated SELL has no defined share quantity
        (Direction::Sell, OrderSize::Spend(_)) => Err(EngineError::InvalidAmount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::types::CircleId;
    use rust_decimal_macros::dec;

    fn setup() -> (Engine, CircleId, MarketId) {
        let engine = Engine::new(EngineConfig::default());
        let circle = engine.create_circle("office pool", UserId(1));
        engine.join_circle(circle, UserId(2)).unwrap();
        let end = Timestamp::from_millis(Timestamp::now().as_millis() + 86_400_000);
        let market = engine
            .create_market(circle, UserId(1), "rain saturday?", "", end, None)
            .unwrap();
        (engine, circle, market)
    }

    #[test]
    fn buy_debits_balance_and_moves_inventory() {
        let (engine, circle, market) = setup();

        let receipt = engine
            .execute_trade(
                market,
                UserId(2),
                Side::Yes,
                Direction::Buy,
                OrderSize::Spend(Dollars::new(dec!(50))),
            )
            .unwrap();

        assert!((receipt.shares.value() - dec!(83.18)).abs() < dec!(0.01));
        assert_eq!(receipt.price_at_trade, dec!(0.5));
        assert!((receipt.new_price_yes - dec!(0.697)).abs() < dec!(0.001));
        assert_eq!(receipt.new_balance.value(), dec!(9950.00));
        assert_eq!(
            engine.ledger().balance(circle, UserId(2)).unwrap().value(),
            dec!(9950.00)
        );

        let cell = engine.market(market).unwrap();
        let m = cell.lock();
        assert_eq!(m.q_yes, receipt.shares.value());
        assert_eq!(m.q_no, dec!(0));
        assert_eq!(m.trades.len(), 1);
    }

    #[test]
    fn sell_requires_holdings() {
        let (engine, _, market) = setup();

        let err = engine.execute_trade(
            market,
            UserId(2),
            Side::Yes,
            Direction::Sell,
            OrderSize::Shares(Shares::new(dec!(5))),
        );
        assert!(matches!(err, Err(EngineError::InsufficientShares { .. })));
    }

    #[test]
    fn buy_then_sell_round_trip_restores_balance() {
        let (engine, circle, market) = setup();

        let bought = engine
            .execute_trade(
                market,
                UserId(2),
                Side::No,
                Direction::Buy,
                OrderSize::Spend(Dollars::new(dec!(120))),
            )
            .unwrap();

        engine
            .execute_trade(
                market,
                UserId(2),
                Side::No,
                Direction::Sell,
                OrderSize::Shares(bought.shares),
            )
            .unwrap();

        let balance = engine.ledger().balance(circle, UserId(2)).unwrap();
        assert!((balance.value() - dec!(10000)).abs() < dec!(0.001));

        let cell = engine.market(market).unwrap();
        let m = cell.lock();
        assert!(m.q_no.abs() < dec!(0.0001));
        assert!(m.position(UserId(2)).unwrap().is_flat());
    }

    #[test]
    fn share_denominated_buy_charges_quoted_cost() {
        let (engine, _, market) = setup();

        let quoted = engine
            .preview_trade(
                market,
                Side::Yes,
                Direction::Buy,
                OrderSize::Shares(Shares::new(dec!(10))),
            )
            .unwrap();

        let receipt = engine
            .execute_trade(
                market,
                UserId(1),
                Side::Yes,
                Direction::Buy,
                OrderSize::Shares(Shares::new(dec!(10))),
            )
            .unwrap();

        assert_eq!(receipt.shares.value(), dec!(10));
        assert_eq!(receipt.amount, quoted.amount);
        // ~$5.06 for 10 shares at even odds with b = 100
        assert!(receipt.amount.value() > dec!(5) && receipt.amount.value() < dec!(5.2));
    }

    #[test]
    fn insufficient_balance_rejects_whole_order() {
        let (engine, circle, market) = setup();

        let err = engine.execute_trade(
            market,
            UserId(2),
            Side::Yes,
            Direction::Buy,
            OrderSize::Spend(Dollars::new(dec!(10000.01))),
        );
        assert!(matches!(
            err,
            Err(EngineError::Ledger(
                crate::ledger::LedgerError::InsufficientBalance { .. }
            ))
        ));

        // nothing moved
        assert_eq!(
            engine.ledger().balance(circle, UserId(2)).unwrap().value(),
            dec!(10000.00)
        );
        let cell = engine.market(market).unwrap();
        let m = cell.lock();
        assert_eq!(m.q_yes, dec!(0));
        assert!(m.trades.is_empty());
        assert!(m.position(UserId(2)).is_none());
    }

    #[test]
    fn non_positive_amounts_rejected() {
        let (engine, _, market) = setup();

        for size in [
            OrderSize::Spend(Dollars::zero()),
            OrderSize::Spend(Dollars::new(dec!(-5))),
            OrderSize::Shares(Shares::zero()),
        ] {
            let err = engine.execute_trade(market, UserId(1), Side::Yes, Direction::Buy, size);
            assert!(matches!(err, Err(EngineError::InvalidAmount)));
        }

        let err = engine.execute_trade(
            market,
            UserId(1),
            Side::Yes,
            Direction::Sell,
            OrderSize::Spend(Dollars::new(dec!(10))),
        );
        assert!(matches!(err, Err(EngineError::InvalidAmount)));
    }

    #[test]
    fn closed_market_rejects_orders() {
        let (engine, _, market) = setup();
        engine.close_market(market).unwrap();

        let err = engine.execute_trade(
            market,
            UserId(1),
            Side::Yes,
            Direction::Buy,
            OrderSize::Spend(Dollars::new(dec!(10))),
        );
        assert!(matches!(err, Err(EngineError::MarketNotOpen(_))));
    }

    #[test]
    fn sell_disabled_by_config() {
        let engine = Engine::new(EngineConfig {
            allow_sell: false,
            ..EngineConfig::default()
        });
        let circle = engine.create_circle("office pool", UserId(1));
        let end = Timestamp::from_millis(Timestamp::now().as_millis() + 86_400_000);
        let market = engine
            .create_market(circle, UserId(1), "t", "", end, None)
            .unwrap();

        let err = engine.execute_trade(
            market,
            UserId(1),
            Side::Yes,
            Direction::Sell,
            OrderSize::Shares(Shares::new(dec!(1))),
        );
        assert!(matches!(err, Err(EngineError::SellDisabled)));
    }

    #[test]
    fn preview_does_not_mutate() {
        let (engine, circle, market) = setup();

        let preview = engine
            .preview_trade(
                market,
                Side::Yes,
                Direction::Buy,
                OrderSize::Spend(Dollars::new(dec!(50))),
            )
            .unwrap();

        assert!((preview.shares.value() - dec!(83.18)).abs() < dec!(0.01));
        assert!((preview.price_after_yes - dec!(0.697)).abs() < dec!(0.001));
        assert!(preview.price_impact > dec!(0.39) && preview.price_impact < dec!(0.40));

        let cell = engine.market(market).unwrap();
        let m = cell.lock();
        assert_eq!(m.q_yes, dec!(0));
        assert!(m.trades.is_empty());
        assert_eq!(
            engine.ledger().balance(circle, UserId(1)).unwrap().value(),
            dec!(10000.00)
        );
    }

    #[test]
    fn preview_and_execution_agree() {
        let (engine, _, market) = setup();

        let preview = engine
            .preview_trade(
                market,
                Side::No,
                Direction::Buy,
                OrderSize::Spend(Dollars::new(dec!(75))),
            )
            .unwrap();
        let receipt = engine
            .execute_trade(
                market,
                UserId(1),
                Side::No,
                Direction::Buy,
                OrderSize::Spend(Dollars::new(dec!(75))),
            )
            .unwrap();

        assert_eq!(preview.shares, receipt.shares);
        assert_eq!(preview.price_after_no, receipt.new_price_no);
    }
}

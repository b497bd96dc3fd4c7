//! Read-only views. Each query copies what it needs under the relevant
//! lock and computes after release; nothing here mutates engine state.

use super::core::Engine;
use super::results::{EngineError, HoldingView, MarketDetail};
use crate::leaderboard::{rank_members, LeaderboardEntry};
use crate::market::Market;
use crate::trade::Trade;
use crate::types::{CircleId, MarketId, Side, UserId};

impl Engine {
    pub fn market_detail(&self, market_id: MarketId) -> Result<MarketDetail, EngineError> {
        let cell = self.market(market_id)?;
        let market = cell.lock();
        Ok(detail_of(&market))
    }

    /// Every market in a circle, newest first.
    pub fn circle_markets(&self, circle_id: CircleId) -> Result<Vec<MarketDetail>, EngineError> {
        if !self.ledger.circle_exists(circle_id) {
            return Err(EngineError::Ledger(
                crate::ledger::LedgerError::CircleNotFound(circle_id),
            ));
        }

        let mut details: Vec<MarketDetail> = Vec::new();
        for id in self.market_ids() {
            let Ok(cell) = self.market(id) else { continue };
            let market = cell.lock();
            if market.circle_id == circle_id {
                details.push(detail_of(&market));
            }
        }
        details.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(details)
    }

    /// Circle standings from a balance snapshot; ties break on join order.
    pub fn leaderboard(&self, circle_id: CircleId) -> Result<Vec<LeaderboardEntry>, EngineError> {
        Ok(rank_members(self.ledger.snapshot(circle_id)?))
    }

    /// The user's open holdings across all markets, valued at current
    /// prices. Flat positions are omitted.
    pub fn portfolio(&self, user: UserId) -> Vec<HoldingView> {
        let mut holdings = Vec::new();
        for id in self.market_ids() {
            let Ok(cell) = self.market(id) else { continue };
            let market = cell.lock();
            let Some(position) = market.position(user) else {
                continue;
            };
            if position.is_flat() {
                continue;
            }

            let price_yes = market.price_yes();
            let price_no = market.price_no();
            holdings.push(HoldingView {
                market_id: market.id,
                market_title: market.title.clone(),
                circle_id: market.circle_id,
                status: market.status,
                yes_shares: position.yes_shares,
                no_shares: position.no_shares,
                price_yes,
                price_no,
                market_value: position.market_value(price_yes, price_no),
            });
        }
        holdings
    }

    /// A market's trades, newest first.
    pub fn trade_history(&self, market_id: MarketId) -> Result<Vec<Trade>, EngineError> {
        let cell = self.market(market_id)?;
        let market = cell.lock();
        let mut trades = market.trades.clone();
        trades.reverse();
        Ok(trades)
    }

    /// One user's trades across all markets, newest first.
    pub fn user_trades(&self, user: UserId) -> Vec<Trade> {
        let mut trades: Vec<Trade> = Vec::new();
        for id in self.market_ids() {
            let Ok(cell) = self.market(id) else { continue };
            let market = cell.lock();
            trades.extend(market.trades.iter().filter(|t| t.user_id == user).cloned());
        }
        trades.sort_by(|a, b| b.executed_at.cmp(&a.executed_at).then(b.id.cmp(&a.id)));
        trades
    }
}

fn detail_of(market: &Market) -> MarketDetail {
    MarketDetail {
        id: market.id,
        circle_id: market.circle_id,
        title: market.title.clone(),
        description: market.description.clone(),
        creator: market.creator,
        end_date: market.end_date,
        status: market.status,
        outcome: market.outcome,
        b: market.b,
        q_yes: market.q_yes,
        q_no: market.q_no,
        price_yes: market.price_yes(),
        price_no: market.price_no(),
        volume_yes: market.volume_yes,
        volume_no: market.volume_no,
        total_volume: market.total_volume(),
        yes_bettors: market.bettor_count(Side::Yes),
        no_bettors: market.bettor_count(Side::No),
    }
}

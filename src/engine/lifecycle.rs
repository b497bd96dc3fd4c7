//! Market lifecycle: advisory close, expiry sweep, resolution payouts.

use super::core::Engine;
use super::results::{EngineError, ResolutionReport};
use crate::types::{Dollars, MarketId, Side, Timestamp, UserId};
use tracing::{info, warn};

impl Engine {
    /// Advisory close. Does not gate resolution and is a no-op on markets
    /// already closed or resolved.
    pub fn close_market(&self, market_id: MarketId) -> Result<(), EngineError> {
        let cell = self.market(market_id)?;
        let mut market = cell.lock();
        if market.is_open() {
            market.close();
            info!(market = market_id.0, "market closed");
        }
        Ok(())
    }

    /// Close every open market whose end date has passed. The embedding
    /// process runs this periodically; returns how many markets it closed.
    pub fn close_expired_markets(&self, now: Timestamp) -> usize {
        let mut closed = 0;
        for id in self.market_ids() {
            let Ok(cell) = self.market(id) else { continue };
            let mut market = cell.lock();
            if market.is_expired(now) {
                market.close();
                closed += 1;
                info!(market = id.0, "expired market closed");
            }
        }
        closed
    }

    /// Resolve a market to an outcome and sweep payouts: every holder's
    /// winning shares convert at $1.00, losing shares at $0, and positions
    /// zero out. Only the market's creator may resolve; resolving twice
    /// fails with the already-resolved error.
    ///
    /// Each holder's payout is its own atomic credit, applied in ascending
    /// user order; a holder whose membership cannot be found is skipped
    /// with a warning and never blocks the rest of the sweep.
    pub fn resolve_market(
        &self,
        market_id: MarketId,
        caller: UserId,
        outcome: Side,
    ) -> Result<ResolutionReport, EngineError> {
        let cell = self.market(market_id)?;
        let mut market = cell.lock();

        if market.creator != caller {
            return Err(EngineError::Unauthorized);
        }
        market.resolve(outcome)?;

        let circle_id = market.circle_id;
        let mut payouts: Vec<(UserId, Dollars)> = market
            .positions
            .iter()
            .map(|(user, position)| (*user, position.payout(outcome)))
            .collect();
        payouts.sort_unstable_by_key(|(user, _)| *user);

        let now = Timestamp::now();
        let mut holders_paid = 0;
        let mut holders_skipped = 0;
        let mut total_paid = Dollars::zero();

        for (user, payout) in payouts {
            if payout.is_positive() {
                match self.ledger.membership(circle_id, user) {
                    Ok(membership) => {
                        membership.lock().credit(payout);
                        holders_paid += 1;
                        total_paid = total_paid.add(payout);
                    }
                    Err(e) => {
                        warn!(
                            market = market_id.0,
                            user = user.0,
                            error = %e,
                            "payout skipped, holder has no membership"
                        );
                        holders_skipped += 1;
                    }
                }
            }
        }

        for position in market.positions.values_mut() {
            position.zero_out(now);
        }

        info!(
            market = market_id.0,
            %outcome,
            holders_paid,
            total_paid = %total_paid,
            "market resolved"
        );

        Ok(ResolutionReport {
            market_id,
            outcome,
            holders_paid,
            holders_skipped,
            total_paid,
        })
    }
}

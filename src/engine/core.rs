// 9.1 engine/core.rs: main engine. an arena of markets, each behind its own
// mutex, plus the circle ledger. all public operations take &self so callers
// run concurrently; writes serialize per market, never process-wide.

use super::results::EngineError;
use crate::config::EngineConfig;
use crate::ledger::Ledger;
use crate::market::Market;
use crate::types::{CircleId, MarketId, Timestamp, TradeId, UserId};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) markets: RwLock<HashMap<MarketId, Arc<Mutex<Market>>>>,
    pub(super) ledger: Ledger,
    next_circle_id: AtomicU64,
    next_market_id: AtomicU64,
    next_trade_id: AtomicU64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            markets: RwLock::new(HashMap::new()),
            ledger: Ledger::new(),
            next_circle_id: AtomicU64::new(1),
            next_market_id: AtomicU64::new(1),
            next_trade_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn create_circle(&self, name: &str, creator: UserId) -> CircleId {
        let id = CircleId(self.next_circle_id.fetch_add(1, Ordering::Relaxed));
        self.ledger.create_circle(
            id,
            name.to_string(),
            creator,
            self.config.starting_balance,
            Timestamp::now(),
        );
        id
    }

    pub fn join_circle(&self, circle_id: CircleId, user: UserId) -> Result<(), EngineError> {
        self.ledger.join(
            circle_id,
            user,
            self.config.starting_balance,
            Timestamp::now(),
        )?;
        Ok(())
    }

    /// Create a market in a circle. The creator must be a member, the end
    /// date must lie in the future, and `b` (defaulted from config when
    /// omitted) must be positive and is immutable afterwards.
    pub fn create_market(
        &self,
        circle_id: CircleId,
        creator: UserId,
        title: &str,
        description: &str,
        end_date: Timestamp,
        liquidity: Option<Decimal>,
    ) -> Result<MarketId, EngineError> {
        // membership lookup doubles as the circle existence check
        self.ledger.membership(circle_id, creator)?;

        let now = Timestamp::now();
        if end_date <= now {
            return Err(EngineError::InvalidEndDate);
        }

        let b = liquidity.unwrap_or(self.config.default_liquidity);
        if b <= Decimal::ZERO {
            return Err(EngineError::InvalidLiquidity);
        }

        let id = MarketId(self.next_market_id.fetch_add(1, Ordering::Relaxed));
        let market = Market::new(
            id,
            circle_id,
            creator,
            title.to_string(),
            description.to_string(),
            end_date,
            b,
            now,
        );
        self.markets.write().insert(id, Arc::new(Mutex::new(market)));
        Ok(id)
    }

    pub(super) fn market(&self, id: MarketId) -> Result<Arc<Mutex<Market>>, EngineError> {
        self.markets
            .read()
            .get(&id)
            .cloned()
            .ok_or(EngineError::MarketNotFound(id))
    }

    pub fn market_ids(&self) -> Vec<MarketId> {
        let mut ids: Vec<MarketId> = self.markets.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub(super) fn next_trade_id(&self) -> TradeId {
        TradeId(self.next_trade_id.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn far_future() -> Timestamp {
        Timestamp::from_millis(Timestamp::now().as_millis() + 86_400_000)
    }

    #[test]
    fn circle_creation_seeds_creator_balance() {
        let engine = Engine::new(EngineConfig::default());
        let circle = engine.create_circle("office pool", UserId(1));
        assert_eq!(
            engine.ledger().balance(circle, UserId(1)).unwrap().value(),
            dec!(10000.00)
        );
    }

    #[test]
    fn market_creation_requires_membership() {
        let engine = Engine::new(EngineConfig::default());
        let circle = engine.create_circle("office pool", UserId(1));

        let err = engine.create_market(circle, UserId(2), "t", "", far_future(), None);
        assert!(matches!(err, Err(EngineError::Ledger(_))));
    }

    #[test]
    fn market_creation_rejects_past_end_date() {
        let engine = Engine::new(EngineConfig::default());
        let circle = engine.create_circle("office pool", UserId(1));

        let err = engine.create_market(
            circle,
            UserId(1),
            "t",
            "",
            Timestamp::from_millis(0),
            None,
        );
        assert!(matches!(err, Err(EngineError::InvalidEndDate)));
    }

    #[test]
    fn market_creation_rejects_non_positive_liquidity() {
        let engine = Engine::new(EngineConfig::default());
        let circle = engine.create_circle("office pool", UserId(1));

        let err = engine.create_market(circle, UserId(1), "t", "", far_future(), Some(dec!(0)));
        assert!(matches!(err, Err(EngineError::InvalidLiquidity)));

        let err = engine.create_market(circle, UserId(1), "t", "", far_future(), Some(dec!(-5)));
        assert!(matches!(err, Err(EngineError::InvalidLiquidity)));
    }

    #[test]
    fn default_liquidity_comes_from_config() {
        let engine = Engine::new(EngineConfig::default());
        let circle = engine.create_circle("office pool", UserId(1));
        let market_id = engine
            .create_market(circle, UserId(1), "t", "", far_future(), None)
            .unwrap();

        let cell = engine.market(market_id).unwrap();
        assert_eq!(cell.lock().b, dec!(100));
    }
}

use tracing::debug;

use crate::engine::algorithm::{self, AlgoParams};
use crate::engine::executor::PaperExecutor;
use crate::engine::types::{EngineError, MarketState, PerLeg, Quote};
use crate::market_data::estimator::SpreadEstimator;

/// Per-tick driver: feeds the estimator, settles fills, assembles the tick
/// state and reconciles desired orders, in that order.
pub struct Manager {
    executor: PaperExecutor,
    estimator: SpreadEstimator,
    params: AlgoParams,
}

impl Manager {
    pub fn new(params: AlgoParams, half_tick: f64) -> Self {
        Self {
            executor: PaperExecutor::new(half_tick),
            estimator: SpreadEstimator::default(),
            params,
        }
    }

    /// Process one market event. The caller guarantees quotes for both legs
    /// and delivers events strictly one at a time; the engine is not safe
    /// for concurrent invocation.
    ///
    /// A limit fill detected here leaves the book unhedged until the next
    /// quote arrives; in paper mode ticks are assumed frequent enough that
    /// the window is negligible.
    pub fn on_quotes(&mut self, quotes: &PerLeg<Quote>) -> Result<(), EngineError> {
        self.estimator.on_quotes(quotes);
        self.executor.apply_quote(quotes);

        let Some(spread) = self.estimator.spread() else {
            debug!("spread estimate not ready: skipping order generation");
            return Ok(());
        };
        let state = MarketState {
            spread,
            quotes: quotes.clone(),
            positions: *self.executor.positions(),
        };
        debug!(?state, "tick state");
        let orders = algorithm::desired_orders(&state, &self.params)?;
        self.executor.manage_orders(&orders, quotes)
    }

    pub fn executor(&self) -> &PaperExecutor {
        &self.executor
    }

    pub fn spread(&self) -> Option<f64> {
        self.estimator.spread()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{Direction, Leg};
    use chrono::{DateTime, Utc};

    fn quote_at(ms: i64, bid: f64, ask: f64) -> Quote {
        Quote {
            timestamp: DateTime::<Utc>::from_timestamp_millis(ms).unwrap(),
            bid_price: bid,
            bid_size: 500.0,
            ask_price: ask,
            ask_size: 500.0,
        }
    }

    fn manager() -> Manager {
        Manager::new(AlgoParams::default(), 0.5)
    }

    #[test]
    fn first_complete_tick_places_both_quotes() {
        let mut manager = manager();
        let quotes = PerLeg {
            near: quote_at(1_000, 100.0, 100.2),
            reference: quote_at(1_000, 110.0, 110.2),
        };
        manager.on_quotes(&quotes).unwrap();

        // Mid gap is 10.0, so the estimate is 5.0: buy at 110.0 - 5 - 5 =
        // 100.0, sell at 110.2 + 5 + 5 = 120.2 rounded up to 120.5.
        assert_eq!(manager.spread(), Some(5.0));
        let buy = manager.executor().live_order(Leg::Near, Direction::Buy).unwrap();
        let sell = manager.executor().live_order(Leg::Near, Direction::Sell).unwrap();
        assert_eq!(buy.price, 100.0);
        assert_eq!(buy.size, 100.0);
        assert_eq!(sell.price, 120.5);
        assert_eq!(sell.size, 100.0);
    }

    #[test]
    fn no_orders_until_estimate_is_ready() {
        let mut manager = manager();
        // Near leg has no ask: the estimator defers and no orders go out.
        let incomplete = PerLeg {
            near: quote_at(1_000, 100.0, 0.0),
            reference: quote_at(1_000, 110.0, 110.2),
        };
        manager.on_quotes(&incomplete).unwrap();
        assert_eq!(manager.spread(), None);
        assert_eq!(manager.executor().live_orders().count(), 0);

        let complete = PerLeg {
            near: quote_at(1_001, 100.0, 100.2),
            reference: quote_at(1_001, 110.0, 110.2),
        };
        manager.on_quotes(&complete).unwrap();
        assert_eq!(manager.executor().live_orders().count(), 2);
    }

    #[test]
    fn fills_are_hedged_on_the_following_tick() {
        let mut manager = manager();
        manager
            .on_quotes(&PerLeg {
                near: quote_at(1_000, 100.0, 100.2),
                reference: quote_at(1_000, 110.0, 110.2),
            })
            .unwrap();

        // Ask drops through the resting buy at 100.0: fill, then the +100
        // exposure is hedged with a reference sell within the same tick's
        // reconciliation pass.
        manager
            .on_quotes(&PerLeg {
                near: quote_at(1_001, 99.0, 99.8),
                reference: quote_at(1_001, 110.0, 110.2),
            })
            .unwrap();
        assert_eq!(manager.executor().positions().near, 100.0);
        assert_eq!(manager.executor().positions().reference, -100.0);
    }

    #[test]
    fn repeated_buy_fills_stop_at_the_position_cap() {
        let mut manager = manager();
        let params = AlgoParams::default();
        manager
            .on_quotes(&PerLeg {
                near: quote_at(1_000, 100.0, 100.2),
                reference: quote_at(1_000, 110.0, 110.2),
            })
            .unwrap();

        // Every tick the ask sits below the resting buy, so the buy fills
        // and is re-placed until the long cap blocks it.
        for i in 1..=60 {
            manager
                .on_quotes(&PerLeg {
                    near: quote_at(1_000 + i, 99.0, 99.8),
                    reference: quote_at(1_000 + i, 110.0, 110.2),
                })
                .unwrap();
            assert!(manager.executor().positions().near <= params.max_position);
        }
        assert_eq!(manager.executor().positions().near, params.max_position);
        assert!(manager
            .executor()
            .live_order(Leg::Near, Direction::Buy)
            .is_none());
        // The short side is still quoted.
        assert!(manager
            .executor()
            .live_order(Leg::Near, Direction::Sell)
            .is_some());
    }

    #[test]
    fn unhedgeable_tick_fails_recoverably_and_retries() {
        let mut manager = manager();
        manager
            .on_quotes(&PerLeg {
                near: quote_at(1_000, 100.0, 100.2),
                reference: quote_at(1_000, 110.0, 110.2),
            })
            .unwrap();

        // The buy fills but the reference leg lost its bid, so the hedge
        // sell cannot execute: the tick aborts without touching positions
        // beyond the fill itself.
        let err = manager
            .on_quotes(&PerLeg {
                near: quote_at(1_001, 99.0, 99.8),
                reference: quote_at(1_001, 0.0, 110.2),
            })
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(manager.executor().positions().near, 100.0);
        assert_eq!(manager.executor().positions().reference, 0.0);

        // Next tick the bid is back and the hedge goes through.
        manager
            .on_quotes(&PerLeg {
                near: quote_at(1_002, 100.0, 100.2),
                reference: quote_at(1_002, 110.0, 110.2),
            })
            .unwrap();
        assert_eq!(manager.executor().positions().reference, -100.0);
    }
}

use tracing::info;

use crate::engine::types::{Leg, PerLeg, Quote};

/// Fair-value offset between the two contracts, fixed from early market data.
///
/// The estimate transitions None -> Some exactly once, from the first quote
/// pair with both sides present on both legs, and is never recomputed. A
/// rolling estimate would track the basis as it decays; the single-shot
/// version is the strategy as deployed.
#[derive(Debug, Default)]
pub struct SpreadEstimator {
    avg_spread: Option<f64>,
}

impl SpreadEstimator {
    pub fn on_quotes(&mut self, quotes: &PerLeg<Quote>) {
        if self.avg_spread.is_some() {
            return;
        }
        let near = quotes.get(Leg::Near);
        let reference = quotes.get(Leg::Reference);
        if !(near.has_bid() && near.has_ask() && reference.has_bid() && reference.has_ask()) {
            return;
        }
        let spread = (reference.mid() - near.mid()) / 2.0;
        info!(spread, "spread estimate fixed from first complete quote pair");
        self.avg_spread = Some(spread);
    }

    /// None until the first complete quote pair has been seen.
    pub fn spread(&self) -> Option<f64> {
        self.avg_spread
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn quote(bid: f64, ask: f64) -> Quote {
        Quote {
            timestamp: DateTime::from_timestamp_millis(1_000).unwrap(),
            bid_price: bid,
            bid_size: 10.0,
            ask_price: ask,
            ask_size: 10.0,
        }
    }

    #[test]
    fn estimates_half_the_mid_gap() {
        let mut estimator = SpreadEstimator::default();
        estimator.on_quotes(&PerLeg {
            near: quote(100.0, 100.2),
            reference: quote(110.0, 110.2),
        });
        assert_eq!(estimator.spread(), Some(5.0));
    }

    #[test]
    fn first_estimate_sticks() {
        let mut estimator = SpreadEstimator::default();
        let first = PerLeg {
            near: quote(100.0, 100.2),
            reference: quote(110.0, 110.2),
        };
        estimator.on_quotes(&first);
        estimator.on_quotes(&PerLeg {
            near: quote(200.0, 200.2),
            reference: quote(190.0, 190.2),
        });
        assert_eq!(estimator.spread(), Some(5.0));
    }

    #[test]
    fn incomplete_quotes_defer_the_estimate() {
        let mut estimator = SpreadEstimator::default();
        estimator.on_quotes(&PerLeg {
            near: quote(100.0, 0.0),
            reference: quote(110.0, 110.2),
        });
        assert_eq!(estimator.spread(), None);
        estimator.on_quotes(&PerLeg {
            near: quote(100.0, 100.2),
            reference: quote(110.0, 110.2),
        });
        assert_eq!(estimator.spread(), Some(5.0));
    }
}

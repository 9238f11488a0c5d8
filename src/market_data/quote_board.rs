use metrics::counter;
use tracing::warn;

use crate::engine::types::{Leg, PerLeg, Quote};

/// Latest best bid/ask per leg.
///
/// Enforces per-leg timestamp monotonicity: a strictly older quote is
/// dropped, an equal-or-newer one replaces the held quote. Equal timestamps
/// are legitimate because the venue rounds them to milliseconds.
#[derive(Debug, Default)]
pub struct QuoteBoard {
    quotes: PerLeg<Option<Quote>>,
}

impl QuoteBoard {
    /// Apply an incoming quote. Returns false when it was rejected as stale.
    pub fn apply(&mut self, leg: Leg, quote: Quote) -> bool {
        let slot = self.quotes.get_mut(leg);
        if let Some(held) = slot {
            if quote.timestamp < held.timestamp {
                warn!(
                    ?leg,
                    incoming = %quote.timestamp,
                    held = %held.timestamp,
                    "stale quote rejected"
                );
                counter!("futarb_stale_quotes").increment(1);
                return false;
            }
        }
        *slot = Some(quote);
        true
    }

    pub fn get(&self, leg: Leg) -> Option<&Quote> {
        self.quotes.get(leg).as_ref()
    }

    /// Complete snapshot, available once both legs have quoted.
    pub fn snapshot(&self) -> Option<PerLeg<Quote>> {
        Some(PerLeg {
            near: self.quotes.near.clone()?,
            reference: self.quotes.reference.clone()?,
        })
    }
}

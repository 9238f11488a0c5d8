use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which of the two tracked contracts a quote or order belongs to.
///
/// The engine trades exactly one pair: limit quotes rest on the near
/// contract, hedges execute on the reference contract. Keeping the pair as
/// an enum makes every per-instrument table a fixed-size array instead of a
/// map with unbounded keys. The mapping from venue symbols to legs lives in
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Leg {
    Near,
    Reference,
}

impl Leg {
    pub const ALL: [Leg; 2] = [Leg::Near, Leg::Reference];

    pub fn index(self) -> usize {
        match self {
            Leg::Near => 0,
            Leg::Reference => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Buy, Direction::Sell];

    pub fn inverse(self) -> Direction {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Direction::Buy => 0,
            Direction::Sell => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "buy"),
            Direction::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKind {
    Limit,
    Market,
}

/// An order as produced by the algorithm.
///
/// Desired orders are transient: they carry no identity across ticks beyond
/// their (leg, direction) slot. The uid is random and only used to correlate
/// log lines, never for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub leg: Leg,
    pub direction: Direction,
    pub kind: OrderKind,
    pub size: f64,
    /// Set for limit orders, `None` for market orders.
    pub price: Option<f64>,
    pub uid: u64,
}

impl Order {
    pub fn limit(leg: Leg, direction: Direction, size: f64, price: f64) -> Self {
        Self {
            leg,
            direction,
            kind: OrderKind::Limit,
            size,
            price: Some(price),
            uid: next_uid(),
        }
    }

    pub fn market(leg: Leg, direction: Direction, size: f64) -> Self {
        Self {
            leg,
            direction,
            kind: OrderKind::Market,
            size,
            price: None,
            uid: next_uid(),
        }
    }
}

fn next_uid() -> u64 {
    rand::thread_rng().gen_range(0..1_000_000_000)
}

/// Best bid/ask snapshot for one contract.
///
/// A zero price on a side means the venue had no quote on that side, not a
/// crossable price of zero. Timestamps per leg are non-decreasing; equal
/// timestamps occur because the venue rounds to milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub timestamp: DateTime<Utc>,
    pub bid_price: f64,
    pub bid_size: f64,
    pub ask_price: f64,
    pub ask_size: f64,
}

impl Quote {
    pub fn has_bid(&self) -> bool {
        self.bid_price > 0.0
    }

    pub fn has_ask(&self) -> bool {
        self.ask_price > 0.0
    }

    pub fn mid(&self) -> f64 {
        (self.bid_price + self.ask_price) / 2.0
    }
}

/// A value per leg. The engine's replacement for symbol-keyed maps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerLeg<T> {
    pub near: T,
    pub reference: T,
}

impl<T> PerLeg<T> {
    pub fn get(&self, leg: Leg) -> &T {
        match leg {
            Leg::Near => &self.near,
            Leg::Reference => &self.reference,
        }
    }

    pub fn get_mut(&mut self, leg: Leg) -> &mut T {
        match leg {
            Leg::Near => &mut self.near,
            Leg::Reference => &mut self.reference,
        }
    }
}

/// Everything the pricing algorithm is allowed to see for one tick.
///
/// Assembled fresh by the driver from the reconciler's position snapshot,
/// the latest quotes and the spread estimate; never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketState {
    pub spread: f64,
    pub quotes: PerLeg<Quote>,
    pub positions: PerLeg<f64>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Contract violation: quoting prices are only defined for the near leg.
    #[error("price requested for {0:?}: only the near leg is quoted")]
    UnpricedLeg(Leg),
    /// Contract violation: hedges only execute on the reference leg.
    #[error("market order uid={uid} targets {leg:?}: hedges execute on the reference leg")]
    BadHedgeLeg { leg: Leg, uid: u64 },
    /// Contract violation: a limit order reached the reconciler without a price.
    #[error("limit order uid={0} has no price")]
    LimitWithoutPrice(u64),
    /// The quote has no usable price on the side a market order needs.
    /// The order is abandoned; positions are untouched.
    #[error("no {side} on {leg:?}: market order uid={uid} cannot execute")]
    MarketUnavailable {
        leg: Leg,
        side: &'static str,
        uid: u64,
    },
}

impl EngineError {
    /// Recoverable errors abort the current tick but leave state consistent;
    /// the next tick retries naturally since desired orders are recomputed
    /// from scratch. Everything else is a logic defect and must stop the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::MarketUnavailable { .. })
    }
}

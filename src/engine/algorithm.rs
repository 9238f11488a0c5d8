use smallvec::SmallVec;
use tracing::debug;

use crate::engine::types::{Direction, EngineError, Leg, MarketState, Order};

/// Tunable quoting parameters. Defaults reproduce the strategy as deployed:
/// quote 100 contracts per side, 5 USD of passive credit, and a symmetric
/// 5000-contract position cap on the near leg.
#[derive(Debug, Clone, Copy)]
pub struct AlgoParams {
    pub spread_credit: f64,
    pub max_position: f64,
    pub order_size: f64,
}

impl Default for AlgoParams {
    fn default() -> Self {
        Self {
            spread_credit: 5.0,
            max_position: 5000.0,
            order_size: 100.0,
        }
    }
}

/// At most one hedge plus one limit order per direction in a tick.
pub type OrderList = SmallVec<[Order; 3]>;

/// Quote price for the near leg, derived from the reference leg only.
///
/// Buys sit below the reference bid by the spread estimate plus the credit;
/// sells mirror above the reference ask. Pricing any other leg is a contract
/// violation.
pub fn price(
    state: &MarketState,
    params: &AlgoParams,
    leg: Leg,
    direction: Direction,
) -> Result<f64, EngineError> {
    if leg != Leg::Near {
        return Err(EngineError::UnpricedLeg(leg));
    }
    let reference = state.quotes.get(Leg::Reference);
    Ok(match direction {
        Direction::Buy => reference.bid_price - state.spread - params.spread_credit,
        Direction::Sell => reference.ask_price + state.spread + params.spread_credit,
    })
}

/// The full desired-order set for one tick: hedge orders first, then limit
/// orders. Pure and deterministic given `state`; the reconciler turns the
/// result into place/amend/cancel actions.
pub fn desired_orders(state: &MarketState, params: &AlgoParams) -> Result<OrderList, EngineError> {
    let mut orders = hedge_orders(state);
    orders.extend(limit_orders(state, params)?);
    Ok(orders)
}

fn limit_orders(state: &MarketState, params: &AlgoParams) -> Result<OrderList, EngineError> {
    let mut result = OrderList::new();
    let position = *state.positions.get(Leg::Near);
    for direction in Direction::ALL {
        match direction {
            Direction::Buy if position >= params.max_position => {
                debug!(
                    position,
                    cap = params.max_position,
                    "skip buy quote: long cap reached"
                );
                continue;
            }
            Direction::Sell if position <= -params.max_position => {
                debug!(
                    position,
                    cap = -params.max_position,
                    "skip sell quote: short cap reached"
                );
                continue;
            }
            _ => {}
        }
        let price = price(state, params, Leg::Near, direction)?;
        result.push(Order::limit(Leg::Near, direction, params.order_size, price));
    }
    Ok(result)
}

/// One market order on the reference leg sized to zero out the combined
/// exposure of both legs, or nothing when already flat.
fn hedge_orders(state: &MarketState) -> OrderList {
    let mut result = OrderList::new();
    let net = state.positions.get(Leg::Near) + state.positions.get(Leg::Reference);
    if net > 0.0 {
        result.push(Order::market(Leg::Reference, Direction::Sell, net));
    } else if net < 0.0 {
        result.push(Order::market(Leg::Reference, Direction::Buy, -net));
    }
    result
}

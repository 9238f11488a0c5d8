use metrics::counter;
use tracing::info;

use crate::engine::types::{Direction, EngineError, Leg, Order, OrderKind, PerLeg, Quote};

/// A resting limit order the reconciler is tracking.
///
/// Gains identity when placed and keeps its uid across amendments; leg and
/// direction are implied by the table slot it lives in.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveOrder {
    pub uid: u64,
    pub price: f64,
    pub size: f64,
}

/// Simulated exchange order book: resting limit orders plus positions.
///
/// All mutation happens inside a single tick, driven by `apply_quote` and
/// `manage_orders`; the run loop serializes ticks so no locking is needed.
/// Per slot the lifecycle is absent -> placed -> amended* -> filled or
/// cancelled -> absent.
#[derive(Debug)]
pub struct PaperExecutor {
    /// Live orders keyed by (leg, direction). The key space is fixed at two
    /// legs times two directions, so a 2x2 table replaces a nested map.
    live: [[Option<LiveOrder>; 2]; 2],
    positions: PerLeg<f64>,
    half_tick: f64,
}

impl PaperExecutor {
    pub fn new(half_tick: f64) -> Self {
        Self {
            live: Default::default(),
            positions: PerLeg::default(),
            half_tick,
        }
    }

    pub fn positions(&self) -> &PerLeg<f64> {
        &self.positions
    }

    pub fn live_order(&self, leg: Leg, direction: Direction) -> Option<&LiveOrder> {
        self.live[leg.index()][direction.index()].as_ref()
    }

    pub fn live_orders(&self) -> impl Iterator<Item = (Leg, Direction, &LiveOrder)> {
        Leg::ALL.into_iter().flat_map(move |leg| {
            Direction::ALL
                .into_iter()
                .filter_map(move |direction| self.live_order(leg, direction).map(|o| (leg, direction, o)))
        })
    }

    /// Settle fills against an incoming quote, near leg only.
    ///
    /// A resting buy fills entirely when the ask trades at or through its
    /// price, a resting sell when the bid does; a zero side never fills.
    /// Both directions are checked independently, so both can fill on the
    /// same tick. There are no partial fills.
    pub fn apply_quote(&mut self, quotes: &PerLeg<Quote>) {
        let near = quotes.get(Leg::Near);

        let buy = self.live[Leg::Near.index()][Direction::Buy.index()]
            .take_if(|order| near.has_ask() && order.price >= near.ask_price);
        if let Some(order) = buy {
            self.positions.near += order.size;
            info!(
                uid = order.uid,
                price = near.ask_price,
                size = order.size,
                "buy filled on near leg"
            );
            info!(positions = ?self.positions, "positions");
            counter!("futarb_fills").increment(1);
        }

        let sell = self.live[Leg::Near.index()][Direction::Sell.index()]
            .take_if(|order| near.has_bid() && order.price <= near.bid_price);
        if let Some(order) = sell {
            self.positions.near -= order.size;
            info!(
                uid = order.uid,
                price = near.bid_price,
                size = order.size,
                "sell filled on near leg"
            );
            info!(positions = ?self.positions, "positions");
            counter!("futarb_fills").increment(1);
        }
    }

    /// Execute a hedge market order synchronously against the current quote.
    ///
    /// Buys need an ask, sells need a bid; when the required side is absent
    /// the order fails without touching positions.
    pub fn execute_market_order(
        &mut self,
        order: &Order,
        quotes: &PerLeg<Quote>,
    ) -> Result<(), EngineError> {
        if order.leg != Leg::Reference {
            return Err(EngineError::BadHedgeLeg {
                leg: order.leg,
                uid: order.uid,
            });
        }
        let quote = quotes.get(order.leg);
        let fill_price = match order.direction {
            Direction::Buy => {
                if !quote.has_ask() {
                    return Err(EngineError::MarketUnavailable {
                        leg: order.leg,
                        side: "ask",
                        uid: order.uid,
                    });
                }
                *self.positions.get_mut(order.leg) += order.size;
                quote.ask_price
            }
            Direction::Sell => {
                if !quote.has_bid() {
                    return Err(EngineError::MarketUnavailable {
                        leg: order.leg,
                        side: "bid",
                        uid: order.uid,
                    });
                }
                *self.positions.get_mut(order.leg) -= order.size;
                quote.bid_price
            }
        };
        info!(
            uid = order.uid,
            direction = %order.direction,
            price = fill_price,
            size = order.size,
            "market order executed on reference leg"
        );
        info!(positions = ?self.positions, "positions");
        counter!("futarb_market_orders").increment(1);
        Ok(())
    }

    /// Converge live orders toward this tick's desired set.
    ///
    /// Market orders execute immediately; limit orders are placed or amended
    /// in their slot; whatever slot was not desired this tick is cancelled.
    pub fn manage_orders(
        &mut self,
        orders: &[Order],
        quotes: &PerLeg<Quote>,
    ) -> Result<(), EngineError> {
        let mut desired = [[false; 2]; 2];
        for order in orders {
            match order.kind {
                OrderKind::Market => self.execute_market_order(order, quotes)?,
                OrderKind::Limit => {
                    self.manage_limit_order(order)?;
                    desired[order.leg.index()][order.direction.index()] = true;
                }
            }
        }

        // Collect cancellation candidates before touching the table.
        let mut cancels: Vec<(Leg, Direction)> = Vec::new();
        for leg in Leg::ALL {
            for direction in Direction::ALL {
                if self.live[leg.index()][direction.index()].is_some()
                    && !desired[leg.index()][direction.index()]
                {
                    cancels.push((leg, direction));
                }
            }
        }
        for (leg, direction) in cancels {
            if let Some(order) = self.live[leg.index()][direction.index()].take() {
                info!(
                    uid = order.uid,
                    ?leg,
                    %direction,
                    price = order.price,
                    "cancel order"
                );
                counter!("futarb_orders_cancelled").increment(1);
            }
        }
        Ok(())
    }

    /// Place a new limit order or amend the resting one in its slot.
    /// An amendment that changes neither price nor size is a silent no-op.
    fn manage_limit_order(&mut self, order: &Order) -> Result<(), EngineError> {
        let raw = order.price.ok_or(EngineError::LimitWithoutPrice(order.uid))?;
        let price = self.rounded_direction_price(order.direction, raw);
        let slot = &mut self.live[order.leg.index()][order.direction.index()];
        match slot {
            Some(live) => {
                if live.price != price || live.size != order.size {
                    live.price = price;
                    live.size = order.size;
                    info!(
                        uid = live.uid,
                        leg = ?order.leg,
                        direction = %order.direction,
                        price,
                        size = order.size,
                        "amend order"
                    );
                    counter!("futarb_orders_amended").increment(1);
                }
            }
            None => {
                info!(
                    uid = order.uid,
                    leg = ?order.leg,
                    direction = %order.direction,
                    price,
                    size = order.size,
                    "place order"
                );
                counter!("futarb_orders_placed").increment(1);
                *slot = Some(LiveOrder {
                    uid: order.uid,
                    price,
                    size: order.size,
                });
            }
        }
        Ok(())
    }

    /// Round to the half-tick in the direction unfavourable to us: buys down,
    /// sells up. Keeps quotes passive after the raw price lands mid-tick.
    fn rounded_direction_price(&self, direction: Direction, price: f64) -> f64 {
        match direction {
            Direction::Buy => (price / self.half_tick).floor() * self.half_tick,
            Direction::Sell => (price / self.half_tick).ceil() * self.half_tick,
        }
    }
}

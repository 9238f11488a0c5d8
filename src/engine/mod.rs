// Order-decision and reconciliation engine
pub mod algorithm; // pure pricing + desired-order computation
pub mod executor;  // simulated order book: live orders, positions, fills
pub mod manager;   // per-tick driver wiring the pieces together
pub mod types;     // legs, directions, orders, quotes, errors

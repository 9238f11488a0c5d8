// Market data module entrypoint
pub mod adapters;    // venue websocket feeds (BitMEX realtime)
pub mod estimator;   // one-shot fair-value spread estimate
pub mod quote_board; // latest best bid/ask per leg, staleness-checked

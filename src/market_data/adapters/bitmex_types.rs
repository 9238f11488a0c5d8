// Wire types for the BitMEX realtime websocket (quote topic only).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::engine::types::Quote;

/// First frame after connecting, e.g.
/// `{"info": "Welcome to the BitMEX Realtime API.", "version": ..., "limit": ...}`
#[derive(Debug, Deserialize)]
pub struct WsWelcome {
    pub info: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// One frame per topic confirming the subscription.
#[derive(Debug, Deserialize)]
pub struct WsSubscribeAck {
    pub success: bool,
    pub subscribe: String,
}

/// Streamed table updates; for the quote topic `action` is `partial` for the
/// initial image and `insert` afterwards.
#[derive(Debug, Deserialize)]
pub struct WsTableMsg {
    pub table: String,
    pub action: String,
    pub data: Vec<WsQuoteRecord>,
}

/// A one-sided book can carry null prices; those map to the engine's
/// "no quote on that side" zero.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsQuoteRecord {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub bid_price: Option<f64>,
    pub bid_size: Option<f64>,
    pub ask_price: Option<f64>,
    pub ask_size: Option<f64>,
}

impl WsQuoteRecord {
    pub fn into_quote(self) -> (String, Quote) {
        let quote = Quote {
            timestamp: self.timestamp,
            bid_price: self.bid_price.unwrap_or(0.0),
            bid_size: self.bid_size.unwrap_or(0.0),
            ask_price: self.ask_price.unwrap_or(0.0),
            ask_size: self.ask_size.unwrap_or(0.0),
        };
        (self.symbol, quote)
    }
}

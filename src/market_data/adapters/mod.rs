// Shared trait + event for venue market data feeds

use thiserror::Error;
use tokio::sync::mpsc;

use crate::engine::types::Quote;

/// A best bid/ask update for one venue symbol, already typed.
#[derive(Debug, Clone)]
pub struct QuoteEvent {
    pub symbol: String,
    pub quote: Quote,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("websocket: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error("quote channel closed by receiver")]
    ChannelClosed,
}

#[async_trait::async_trait]
pub trait VenueAdapter {
    /// Stream quote updates into `tx` until the feed ends or fails.
    async fn run(&self, tx: mpsc::Sender<QuoteEvent>) -> Result<(), FeedError>;
}

pub mod bitmex;
pub mod bitmex_types;

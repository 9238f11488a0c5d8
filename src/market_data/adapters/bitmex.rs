use std::collections::HashSet;

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use super::bitmex_types::{WsSubscribeAck, WsTableMsg, WsWelcome};
use super::{FeedError, QuoteEvent, VenueAdapter};

pub const REALTIME_URL: &str = "wss://www.bitmex.com/realtime";

const WELCOME_INFO: &str = "Welcome to the BitMEX Realtime API.";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Streams best bid/ask quotes for a set of symbols from the BitMEX
/// realtime websocket. Subscription rides the URL query string, so the
/// adapter never writes to the socket; it validates the welcome frame and
/// one ack per topic before forwarding quote records.
pub struct BitmexAdapter {
    ws_url: String,
    symbols: Vec<String>,
}

impl BitmexAdapter {
    pub fn new(ws_url: impl Into<String>, symbols: Vec<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            symbols,
        }
    }

    fn topics(&self) -> Vec<String> {
        self.symbols.iter().map(|s| format!("quote:{s}")).collect()
    }

    fn subscribe_url(&self) -> String {
        format!("{}?subscribe={}", self.ws_url, self.topics().join(","))
    }

    /// Next text frame, skipping keepalives.
    async fn next_text(ws: &mut WsStream) -> Result<String, FeedError> {
        while let Some(msg) = ws.next().await {
            match msg? {
                Message::Text(text) => return Ok(text),
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(frame) => {
                    return Err(FeedError::Protocol(format!(
                        "connection closed during handshake: {frame:?}"
                    )))
                }
                other => debug!(?other, "ignoring non-text frame"),
            }
        }
        Err(FeedError::Protocol("stream ended during handshake".into()))
    }

    async fn ensure_welcome(ws: &mut WsStream) -> Result<(), FeedError> {
        let text = Self::next_text(ws).await?;
        let welcome: WsWelcome = serde_json::from_str(&text)?;
        if welcome.info != WELCOME_INFO {
            return Err(FeedError::Protocol(format!(
                "unexpected first message: {}",
                welcome.info
            )));
        }
        Ok(())
    }

    async fn ensure_subscribed(&self, ws: &mut WsStream) -> Result<(), FeedError> {
        let expected: HashSet<String> = self.topics().into_iter().collect();
        let mut acked: HashSet<String> = HashSet::new();
        for _ in 0..expected.len() {
            let text = Self::next_text(ws).await?;
            let ack: WsSubscribeAck = serde_json::from_str(&text)?;
            if !ack.success {
                return Err(FeedError::Protocol(format!(
                    "subscription refused: {}",
                    ack.subscribe
                )));
            }
            acked.insert(ack.subscribe);
        }
        if acked != expected {
            return Err(FeedError::Protocol(format!(
                "acked topics {acked:?} do not match requested {expected:?}"
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl VenueAdapter for BitmexAdapter {
    async fn run(&self, tx: mpsc::Sender<QuoteEvent>) -> Result<(), FeedError> {
        let url = self.subscribe_url();
        info!(%url, "connecting to BitMEX realtime feed");
        let (mut ws, _response) = connect_async(url.as_str()).await?;
        Self::ensure_welcome(&mut ws).await?;
        self.ensure_subscribed(&mut ws).await?;
        info!(symbols = ?self.symbols, "subscribed to quote stream");

        while let Some(msg) = ws.next().await {
            match msg? {
                Message::Text(text) => {
                    let msg: WsTableMsg = serde_json::from_str(&text)?;
                    if msg.table != "quote" {
                        return Err(FeedError::Protocol(format!(
                            "unknown table {}",
                            msg.table
                        )));
                    }
                    if !matches!(msg.action.as_str(), "partial" | "insert") {
                        return Err(FeedError::Protocol(format!(
                            "unexpected quote action {}",
                            msg.action
                        )));
                    }
                    for record in msg.data {
                        let (symbol, quote) = record.into_quote();
                        if tx.send(QuoteEvent { symbol, quote }).await.is_err() {
                            return Err(FeedError::ChannelClosed);
                        }
                    }
                }
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(frame) => {
                    info!(?frame, "feed closed by server");
                    break;
                }
                other => debug!(?other, "ignoring non-text frame"),
            }
        }
        Ok(())
    }
}

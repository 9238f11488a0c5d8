use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use futarb::config::AppConfig;
use futarb::engine::manager::Manager;
use futarb::market_data::adapters::bitmex::BitmexAdapter;
use futarb::market_data::adapters::VenueAdapter;
use futarb::market_data::quote_board::QuoteBoard;
use futarb::{shutdown, telemetry};

/// Paper-trading futures arbitrage: quote the near contract around a fair
/// value derived from the reference contract, hedge fills at market.
#[derive(Debug, Parser)]
#[command(name = "futarb", version)]
struct Args {
    /// Optional TOML config file; FUTARB_* env vars override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    telemetry::init_tracing(&args.log_level);
    telemetry::init_metrics();

    let cfg = AppConfig::load(args.config.as_deref()).context("load configuration")?;
    info!(?cfg, "starting futarb");
    run(cfg).await
}

async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let pair = cfg.pair();
    let adapter = BitmexAdapter::new(cfg.ws_url.clone(), pair.symbols());
    let (tx, mut rx) = mpsc::channel(cfg.quote_buffer);

    let (handle, mut shutdown) = shutdown::channel();
    tokio::spawn(shutdown::signal_listener(handle));
    let feed = tokio::spawn(async move { adapter.run(tx).await });

    let mut board = QuoteBoard::default();
    let mut manager = Manager::new(cfg.algo_params(), cfg.half_tick);

    // One quote event per loop turn: fill detection and reconciliation for a
    // tick always complete before the next tick starts.
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("shutdown requested, stopping");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else {
                    // Feed ended; its result is surfaced below.
                    break;
                };
                let Some(leg) = pair.leg_of(&event.symbol) else {
                    warn!(symbol = %event.symbol, "quote for untracked symbol");
                    continue;
                };
                if !board.apply(leg, event.quote) {
                    continue;
                }
                let Some(quotes) = board.snapshot() else {
                    continue;
                };
                if let Err(err) = manager.on_quotes(&quotes) {
                    if err.is_recoverable() {
                        warn!(%err, "tick aborted");
                    } else {
                        return Err(err).context("engine contract violation");
                    }
                }
            }
        }
    }

    drop(rx);
    feed.abort();
    match feed.await {
        Ok(Ok(())) => info!("feed finished"),
        Ok(Err(err)) => return Err(err).context("market data feed failed"),
        Err(join) if join.is_cancelled() => {}
        Err(join) => return Err(join).context("feed task failed"),
    }
    info!(positions = ?manager.executor().positions(), "final positions");
    Ok(())
}

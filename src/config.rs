use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::engine::algorithm::AlgoParams;
use crate::engine::types::Leg;
use crate::market_data::adapters::bitmex;

/// Runtime configuration: defaults, then an optional TOML file, then
/// `FUTARB_*` environment variables. Defaults reproduce the deployed
/// strategy (XBTM20 quoted against XBTU20).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub near_symbol: String,
    pub reference_symbol: String,
    pub ws_url: String,
    pub order_size: f64,
    pub max_position: f64,
    pub spread_credit: f64,
    pub half_tick: f64,
    pub quote_buffer: usize,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("near_symbol", "XBTM20")?
            .set_default("reference_symbol", "XBTU20")?
            .set_default("ws_url", bitmex::REALTIME_URL)?
            .set_default("order_size", 100.0)?
            .set_default("max_position", 5000.0)?
            .set_default("spread_credit", 5.0)?
            .set_default("half_tick", 0.5)?
            .set_default("quote_buffer", 1024_i64)?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(Environment::with_prefix("FUTARB"))
            .build()?
            .try_deserialize()
    }

    pub fn pair(&self) -> InstrumentPair {
        InstrumentPair {
            near: self.near_symbol.clone(),
            reference: self.reference_symbol.clone(),
        }
    }

    pub fn algo_params(&self) -> AlgoParams {
        AlgoParams {
            spread_credit: self.spread_credit,
            max_position: self.max_position,
            order_size: self.order_size,
        }
    }
}

/// Venue symbols for the two legs: the boundary between opaque exchange
/// identifiers and the engine's `Leg` enum.
#[derive(Debug, Clone)]
pub struct InstrumentPair {
    pub near: String,
    pub reference: String,
}

impl InstrumentPair {
    pub fn leg_of(&self, symbol: &str) -> Option<Leg> {
        if symbol == self.near {
            Some(Leg::Near)
        } else if symbol == self.reference {
            Some(Leg::Reference)
        } else {
            None
        }
    }

    pub fn symbol(&self, leg: Leg) -> &str {
        match leg {
            Leg::Near => &self.near,
            Leg::Reference => &self.reference,
        }
    }

    pub fn symbols(&self) -> Vec<String> {
        vec![self.near.clone(), self.reference.clone()]
    }
}

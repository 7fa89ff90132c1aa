use std::path::PathBuf;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::api::OptimiseRequest;
use crate::domain::{BatteryConfig, GridConnection};
use crate::optimizer::OptimizerSettings;

pub const CONFIG_FILE: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "DISPATCH__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Battery used when a request leaves fields unset.
    pub battery: BatteryConfig,
    pub grid: GridConnection,
    pub optimizer: OptimizerSettings,
    pub forecast: ForecastConfig,
    pub telemetry: TelemetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            battery: BatteryConfig::default(),
            grid: GridConnection::household(),
            optimizer: OptimizerSettings::default(),
            forecast: ForecastConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Layout of the forecast directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastSource {
    /// One `{forecast_id}.json` file of aligned records.
    #[default]
    Snapshot,
    /// A `{forecast_id}/` directory of solar, price and load files.
    Components,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub source: ForecastSource,
    pub dir: PathBuf,
    pub default_id: String,
    pub export_price_pence: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            source: ForecastSource::Snapshot,
            dir: PathBuf::from("data/forecasts"),
            default_id: "latest".to_string(),
            export_price_pence: 15.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
}

impl Config {
    /// Defaults, then `config/default.toml` when present, then `DISPATCH__*`
    /// environment variables (`DISPATCH__BATTERY__CAPACITY_KWH=10`).
    pub fn load() -> Result<Self> {
        Self::figment(CONFIG_FILE)
    }

    pub fn figment(path: &str) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Ok(figment.extract()?)
    }

    /// Request carrying the configured household, for runs without a body.
    pub fn default_request(&self) -> OptimiseRequest {
        OptimiseRequest::from_config(&self.battery, &self.grid, self.forecast.export_price_pence)
    }
}

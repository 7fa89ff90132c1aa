use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info};

use super::ForecastProvider;
use crate::domain::Interval;

/// One half-hour record of a forecast file, prices in pence/kWh.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastRecord {
    pub period_end: DateTime<Utc>,
    pub solar_kwh: f64,
    pub demand_kwh: f64,
    pub price_pence: f64,
    #[serde(default)]
    pub export_price_pence: Option<f64>,
}

impl ForecastRecord {
    fn into_interval(self, export_price: f64) -> Interval {
        Interval::new(
            self.period_end,
            self.solar_kwh,
            self.demand_kwh,
            pence_to_pounds(self.price_pence),
            self.export_price_pence
                .map(pence_to_pounds)
                .unwrap_or(export_price),
        )
    }
}

pub fn pence_to_pounds(pence: f64) -> f64 {
    pence / 100.0
}

/// Reads `{dir}/{forecast_id}.json` snapshots produced by an upstream
/// acquisition job.
#[derive(Debug, Clone)]
pub struct FileForecastProvider {
    dir: PathBuf,
    default_id: String,
}

impl FileForecastProvider {
    pub fn new(dir: impl Into<PathBuf>, default_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            default_id: default_id.into(),
        }
    }

    pub fn path_for(&self, forecast_id: &str) -> Result<PathBuf> {
        check_forecast_id(forecast_id)?;
        Ok(self.dir.join(format!("{forecast_id}.json")))
    }
}

/// Ids become file names, so only `[A-Za-z0-9_-]` is accepted.
pub(crate) fn check_forecast_id(forecast_id: &str) -> Result<()> {
    if forecast_id.is_empty()
        || !forecast_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        bail!("invalid forecast id {forecast_id:?}");
    }
    Ok(())
}

pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read forecast file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse forecast file {}", path.display()))
}

#[async_trait]
impl ForecastProvider for FileForecastProvider {
    async fn intervals(&self, forecast_id: Option<String>, export_price: f64) -> Result<Vec<Interval>> {
        let id = forecast_id.unwrap_or_else(|| self.default_id.clone());
        let path = self.path_for(&id)?;
        debug!(path = %path.display(), "loading forecast");

        let records: Vec<ForecastRecord> = read_json(&path).await?;
        let intervals: Vec<Interval> = records
            .into_iter()
            .map(|r| r.into_interval(export_price))
            .collect();

        info!(forecast_id = %id, intervals = intervals.len(), "forecast loaded");
        Ok(intervals)
    }
}

//! Forecasts assembled from separately acquired inputs.
//!
//! A forecast id names a directory holding three files:
//! - `solar.json`: `[{period_end, solar_kwh}]`, the slots to plan for
//! - `prices.json`: `[{period_end, price_pence}]`, import tariff
//! - `load.json`: `[{timestamp, load_kw}]`, recent household load samples
//!
//! Demand is projected from the load history by half-hour of day and the
//! three series are inner-joined on `period_end`.

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::file::{check_forecast_id, read_json};
use super::{join_series, pence_to_pounds, DemandProfile, ForecastProvider, PricePoint, SolarPoint};
use crate::domain::Interval;

pub const SOLAR_FILE: &str = "solar.json";
pub const PRICES_FILE: &str = "prices.json";
pub const LOAD_FILE: &str = "load.json";

#[derive(Debug, Clone, Deserialize)]
pub struct PriceRecord {
    pub period_end: DateTime<Utc>,
    pub price_pence: f64,
}

impl From<PriceRecord> for PricePoint {
    fn from(r: PriceRecord) -> Self {
        PricePoint {
            period_end: r.period_end,
            import_price: pence_to_pounds(r.price_pence),
        }
    }
}

/// One load power reading.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LoadSample {
    pub timestamp: DateTime<Utc>,
    pub load_kw: f64,
}

#[derive(Debug, Clone)]
pub struct ComponentForecastProvider {
    dir: PathBuf,
    default_id: String,
}

impl ComponentForecastProvider {
    pub fn new(dir: impl Into<PathBuf>, default_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            default_id: default_id.into(),
        }
    }

    pub fn dir_for(&self, forecast_id: &str) -> Result<PathBuf> {
        check_forecast_id(forecast_id)?;
        Ok(self.dir.join(forecast_id))
    }
}

#[async_trait]
impl ForecastProvider for ComponentForecastProvider {
    async fn intervals(&self, forecast_id: Option<String>, export_price: f64) -> Result<Vec<Interval>> {
        let id = forecast_id.unwrap_or_else(|| self.default_id.clone());
        let dir = self.dir_for(&id)?;
        debug!(dir = %dir.display(), "loading forecast components");

        let solar_path = dir.join(SOLAR_FILE);
        let prices_path = dir.join(PRICES_FILE);
        let load_path = dir.join(LOAD_FILE);
        let (solar, prices, load) = tokio::try_join!(
            read_json::<Vec<SolarPoint>>(&solar_path),
            read_json::<Vec<PriceRecord>>(&prices_path),
            read_json::<Vec<LoadSample>>(&load_path),
        )?;

        let history: Vec<(DateTime<Utc>, f64)> = load.iter().map(|s| (s.timestamp, s.load_kw)).collect();
        let profile = DemandProfile::from_load_history(&history);
        let period_ends: Vec<DateTime<Utc>> = solar.iter().map(|s| s.period_end).collect();
        let demand = profile.project(&period_ends);
        let prices: Vec<PricePoint> = prices.into_iter().map(PricePoint::from).collect();

        let intervals = join_series(&solar, &prices, &demand, export_price);
        if intervals.len() < solar.len() {
            warn!(
                forecast_id = %id,
                solar = solar.len(),
                joined = intervals.len(),
                "solar slots without a price dropped"
            );
        }

        info!(forecast_id = %id, intervals = intervals.len(), "forecast assembled");
        Ok(intervals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::DEFAULT_SLOT_DEMAND_KWH;
    use approx::assert_relative_eq;

    fn write_components(root: &std::path::Path, id: &str, prices: &str) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(SOLAR_FILE),
            r#"[
                {"period_end": "2025-09-20T12:30:00Z", "solar_kwh": 1.2},
                {"period_end": "2025-09-20T13:00:00Z", "solar_kwh": 1.4},
                {"period_end": "2025-09-20T13:30:00Z", "solar_kwh": 0.9}
            ]"#,
        )
        .unwrap();
        std::fs::write(dir.join(PRICES_FILE), prices).unwrap();
        std::fs::write(
            dir.join(LOAD_FILE),
            r#"[
                {"timestamp": "2025-09-18T12:35:00Z", "load_kw": 0.8},
                {"timestamp": "2025-09-19T12:40:00Z", "load_kw": 1.6},
                {"timestamp": "2025-09-19T13:05:00Z", "load_kw": 0.4}
            ]"#,
        )
        .unwrap();
    }

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dispatch-components-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_assembles_intervals_from_components() {
        let root = scratch_dir();
        write_components(
            &root,
            "today",
            r#"[
                {"period_end": "2025-09-20T12:30:00Z", "price_pence": 20.0},
                {"period_end": "2025-09-20T13:00:00Z", "price_pence": 18.0},
                {"period_end": "2025-09-20T13:30:00Z", "price_pence": 22.0}
            ]"#,
        );

        let provider = ComponentForecastProvider::new(&root, "today");
        let intervals = provider.intervals(None, 0.15).await.unwrap();

        assert_eq!(intervals.len(), 3);
        // Slot 25 (12:30) averages 1.2 kW across two days.
        assert_relative_eq!(intervals[0].demand_kwh, 0.6);
        assert_relative_eq!(intervals[1].demand_kwh, 0.2);
        assert_relative_eq!(intervals[2].demand_kwh, DEFAULT_SLOT_DEMAND_KWH);
        assert_relative_eq!(intervals[1].solar_kwh, 1.4);
        assert_relative_eq!(intervals[1].import_price, 0.18);
        assert_relative_eq!(intervals[2].export_price, 0.15);

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_unpriced_slots_are_dropped() {
        let root = scratch_dir();
        write_components(
            &root,
            "partial",
            r#"[
                {"period_end": "2025-09-20T12:30:00Z", "price_pence": 20.0},
                {"period_end": "2025-09-20T13:00:00Z", "price_pence": 18.0}
            ]"#,
        );

        let provider = ComponentForecastProvider::new(&root, "today");
        let intervals = provider.intervals(Some("partial".into()), 0.15).await.unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[1].period_end.to_rfc3339(), "2025-09-20T13:00:00+00:00");

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_missing_component_is_an_error() {
        let root = scratch_dir();
        std::fs::create_dir_all(root.join("today")).unwrap();

        let provider = ComponentForecastProvider::new(&root, "today");
        let err = provider.intervals(None, 0.15).await.unwrap_err();
        assert!(err.to_string().contains("failed to read forecast file"));
        assert!(provider.dir_for("../today").is_err());

        std::fs::remove_dir_all(root).ok();
    }
}

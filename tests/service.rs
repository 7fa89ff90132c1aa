//! Service-level runs through the request/response contract.

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use battery_dispatch::api::{DispatchService, OptimiseRequest};
use battery_dispatch::config::{Config, ForecastConfig, ForecastSource};
use battery_dispatch::domain::Interval;
use battery_dispatch::forecast::ForecastProvider;
use battery_dispatch::optimizer::{DispatchOptimizer, LpOptimizer};
use battery_dispatch::ErrorKind;

use common::series;

/// Serves one fixed series regardless of id.
struct StaticForecast(Vec<Interval>);

#[async_trait]
impl ForecastProvider for StaticForecast {
    async fn intervals(&self, _forecast_id: Option<String>, export_price: f64) -> Result<Vec<Interval>> {
        let mut intervals = self.0.clone();
        Interval::broadcast_export_price(&mut intervals, export_price);
        Ok(intervals)
    }
}

fn static_service(intervals: Vec<Interval>) -> DispatchService {
    DispatchService::new(
        Arc::new(StaticForecast(intervals)),
        DispatchOptimizer::new(LpOptimizer::default()),
        Duration::from_secs(30),
    )
}

fn scenario() -> Vec<Interval> {
    series(
        &[0.0, 2.0, 2.0, 0.0],
        &[1.0, 1.0, 1.0, 1.0],
        &[0.30, 0.10, 0.10, 0.30],
        0.0,
    )
}

#[tokio::test]
async fn test_scenario_through_the_service() {
    let request = OptimiseRequest {
        battery_capacity_kwh: 4.0,
        initial_soc_pct: 50.0,
        min_soc_pct: 0.0,
        max_soc_pct: 100.0,
        charge_power_kw: 2.0,
        discharge_power_kw: 2.0,
        export_price_pence: 5.0,
        ..Default::default()
    };

    let response = static_service(scenario()).optimise(request).await.unwrap();
    assert_eq!(response.status, "success");
    assert_eq!(response.schedule.len(), 4);
    assert!((response.summary.total_cost_gbp + 0.10).abs() < 1e-5);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["schedule"][0]["action"], "discharge");
    assert!(json["summary"]["savings_gbp"].as_f64().unwrap() > 0.59);
}

#[tokio::test]
async fn test_concurrent_requests() {
    let service = static_service(scenario());
    let mut set = tokio::task::JoinSet::new();
    for capacity in [2.0, 4.0, 6.0, 8.0] {
        let service = service.clone();
        set.spawn(async move {
            let request = OptimiseRequest {
                battery_capacity_kwh: capacity,
                export_price_pence: 5.0,
                ..Default::default()
            };
            service.optimise(request).await
        });
    }

    while let Some(joined) = set.join_next().await {
        let response = joined.unwrap().unwrap();
        assert_eq!(response.schedule.len(), 4);
    }
}

#[tokio::test]
async fn test_error_responses_carry_kind_and_location() {
    let mut intervals = scenario();
    intervals.swap(1, 2);

    let err = static_service(intervals)
        .optimise(OptimiseRequest::default())
        .await
        .unwrap_err();
    let response = err.to_response();
    assert_eq!(response.kind, ErrorKind::ValidationError);
    assert_eq!(response.field.as_deref(), Some("period_end"));
    assert_eq!(response.interval_index, Some(1));

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["kind"], "ValidationError");
}

#[tokio::test]
async fn test_file_backed_service() {
    let dir: PathBuf = std::env::temp_dir().join(format!("dispatch-service-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("latest.json"),
        r#"[
            {"period_end": "2025-09-20T17:00:00Z", "solar_kwh": 0.0, "demand_kwh": 0.8, "price_pence": 12.0},
            {"period_end": "2025-09-20T17:30:00Z", "solar_kwh": 0.0, "demand_kwh": 1.0, "price_pence": 35.0}
        ]"#,
    )
    .unwrap();

    let config = Config {
        forecast: ForecastConfig {
            source: ForecastSource::Snapshot,
            dir: dir.clone(),
            default_id: "latest".to_string(),
            export_price_pence: 5.0,
        },
        ..Default::default()
    };
    let service = DispatchService::from_config(&config);

    let response = service.optimise(config.default_request()).await.unwrap();
    assert_eq!(response.schedule.len(), 2);
    assert!((response.schedule[0].import_price - 0.12).abs() < 1e-12);
    assert!((response.schedule[0].export_price - 0.05).abs() < 1e-12);
    assert!(response.summary.savings_gbp > 0.0);

    let missing = OptimiseRequest {
        forecast_id: Some("tomorrow".to_string()),
        ..config.default_request()
    };
    let err = service.optimise(missing).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ForecastError);

    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn test_bundled_config_and_forecast_produce_a_schedule() {
    let config = Config::load().unwrap();
    assert!(!config.grid.is_unlimited());

    let service = DispatchService::from_config(&config);
    let response = service.optimise(config.default_request()).await.unwrap();

    assert_eq!(response.status, "success");
    assert_eq!(response.schedule.len(), 16);
    let import_cap = config.grid.import_limit_kw.unwrap() * 0.5;
    let export_cap = config.grid.export_limit_kw.unwrap() * 0.5;
    for entry in &response.schedule {
        assert!(entry.grid_import_kwh <= import_cap + 1e-5);
        assert!(entry.grid_export_kwh <= export_cap + 1e-5);
        assert!(entry.soc_pct >= config.battery.min_soc_pct - 1e-5);
        assert!(entry.soc_pct <= config.battery.max_soc_pct + 1e-5);
    }
    assert!(response.summary.savings_gbp >= -1e-6);
}

#[tokio::test]
async fn test_component_backed_service() {
    let dir: PathBuf = std::env::temp_dir().join(format!("dispatch-components-{}", uuid::Uuid::new_v4()));
    let today = dir.join("today");
    std::fs::create_dir_all(&today).unwrap();
    std::fs::write(
        today.join("solar.json"),
        r#"[
            {"period_end": "2025-09-20T17:00:00Z", "solar_kwh": 0.0},
            {"period_end": "2025-09-20T17:30:00Z", "solar_kwh": 0.0}
        ]"#,
    )
    .unwrap();
    std::fs::write(
        today.join("prices.json"),
        r#"[
            {"period_end": "2025-09-20T17:00:00Z", "price_pence": 12.0},
            {"period_end": "2025-09-20T17:30:00Z", "price_pence": 35.0}
        ]"#,
    )
    .unwrap();
    std::fs::write(
        today.join("load.json"),
        r#"[
            {"timestamp": "2025-09-19T17:10:00Z", "load_kw": 1.6},
            {"timestamp": "2025-09-19T17:40:00Z", "load_kw": 2.0}
        ]"#,
    )
    .unwrap();

    let config = Config {
        forecast: ForecastConfig {
            source: ForecastSource::Components,
            dir: dir.clone(),
            default_id: "today".to_string(),
            export_price_pence: 5.0,
        },
        ..Default::default()
    };

    let response = DispatchService::from_config(&config)
        .optimise(config.default_request())
        .await
        .unwrap();
    assert_eq!(response.schedule.len(), 2);
    assert!((response.schedule[0].demand_kwh - 0.8).abs() < 1e-12);
    assert!((response.schedule[1].demand_kwh - 1.0).abs() < 1e-12);
    assert!((response.schedule[1].import_price - 0.35).abs() < 1e-12);
    assert!(response.summary.savings_gbp > 0.0);

    std::fs::remove_dir_all(dir).ok();
}

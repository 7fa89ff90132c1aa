#![allow(dead_code)]
//! Shared fixtures for the integration suites.

use battery_dispatch::domain::{BatteryConfig, DispatchSchedule, Interval};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub const EPS: f64 = 1e-5;

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 20, 0, 0, 0).unwrap()
}

/// Contiguous half-hour series; prices in GBP/kWh.
pub fn series(solar: &[f64], demand: &[f64], import: &[f64], export: f64) -> Vec<Interval> {
    assert_eq!(solar.len(), demand.len());
    assert_eq!(solar.len(), import.len());
    solar
        .iter()
        .zip(demand)
        .zip(import)
        .enumerate()
        .map(|(i, ((s, d), p))| {
            Interval::new(start() + Duration::minutes(30 * (i as i64 + 1)), *s, *d, *p, export)
        })
        .collect()
}

pub fn battery(capacity_kwh: f64, initial_pct: f64, min_pct: f64, max_pct: f64, power_kw: f64) -> BatteryConfig {
    BatteryConfig {
        capacity_kwh,
        initial_soc_pct: initial_pct,
        min_soc_pct: min_pct,
        max_soc_pct: max_pct,
        charge_power_kw: power_kw,
        discharge_power_kw: power_kw,
    }
}

/// Energy balance, SOC window, SOC recursion and power limits on every row.
pub fn assert_physical(schedule: &DispatchSchedule, battery: &BatteryConfig, duration_h: f64) {
    let max_charge = battery.charge_power_kw * duration_h;
    let max_discharge = battery.discharge_power_kw * duration_h;
    let mut prev_soc = battery.initial_soc_kwh();

    for (i, e) in schedule.entries.iter().enumerate() {
        assert!(e.balance_residual_kwh().abs() < EPS, "row {i} unbalanced: {e:?}");
        assert!(e.soc_kwh >= battery.min_soc_kwh() - 1e-9, "row {i} below floor");
        assert!(e.soc_kwh <= battery.max_soc_kwh() + 1e-9, "row {i} above ceiling");
        assert!(
            (e.soc_kwh - prev_soc - e.batt_charge_kwh + e.batt_discharge_kwh).abs() < EPS,
            "row {i} breaks the SOC recursion"
        );
        assert!(e.batt_charge_kwh <= max_charge + EPS, "row {i} over charge limit");
        assert!(e.batt_discharge_kwh <= max_discharge + EPS, "row {i} over discharge limit");
        for flow in [e.batt_charge_kwh, e.batt_discharge_kwh, e.grid_import_kwh, e.grid_export_kwh] {
            assert!(flow >= 0.0, "row {i} has a negative flow");
        }
        prev_soc = e.soc_kwh;
    }
}

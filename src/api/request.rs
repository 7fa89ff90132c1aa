use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{BatteryConfig, GridConnection};
use crate::forecast::pence_to_pounds;

/// Inputs of one optimisation run. Missing fields take the household defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OptimiseRequest {
    /// Forecast to optimise over; the provider's default when absent.
    pub forecast_id: Option<String>,

    #[validate(range(exclusive_min = 0.0))]
    pub battery_capacity_kwh: f64,

    #[validate(range(min = 0.0, max = 100.0))]
    pub initial_soc_pct: f64,

    #[validate(range(min = 0.0, max = 100.0))]
    pub min_soc_pct: f64,

    #[validate(range(min = 0.0, max = 100.0))]
    pub max_soc_pct: f64,

    #[validate(range(min = 0.0))]
    pub charge_power_kw: f64,

    #[validate(range(min = 0.0))]
    pub discharge_power_kw: f64,

    /// Flat export tariff (pence/kWh).
    pub export_price_pence: f64,

    #[validate(range(min = 0.0))]
    pub grid_import_limit_kw: Option<f64>,

    #[validate(range(min = 0.0))]
    pub grid_export_limit_kw: Option<f64>,
}

impl Default for OptimiseRequest {
    fn default() -> Self {
        Self::from_config(&BatteryConfig::default(), &GridConnection::household(), 15.0)
    }
}

impl OptimiseRequest {
    pub fn from_config(battery: &BatteryConfig, grid: &GridConnection, export_price_pence: f64) -> Self {
        Self {
            forecast_id: None,
            battery_capacity_kwh: battery.capacity_kwh,
            initial_soc_pct: battery.initial_soc_pct,
            min_soc_pct: battery.min_soc_pct,
            max_soc_pct: battery.max_soc_pct,
            charge_power_kw: battery.charge_power_kw,
            discharge_power_kw: battery.discharge_power_kw,
            export_price_pence,
            grid_import_limit_kw: grid.import_limit_kw,
            grid_export_limit_kw: grid.export_limit_kw,
        }
    }

    pub fn battery(&self) -> BatteryConfig {
        BatteryConfig {
            capacity_kwh: self.battery_capacity_kwh,
            initial_soc_pct: self.initial_soc_pct,
            min_soc_pct: self.min_soc_pct,
            max_soc_pct: self.max_soc_pct,
            charge_power_kw: self.charge_power_kw,
            discharge_power_kw: self.discharge_power_kw,
        }
    }

    pub fn grid(&self) -> GridConnection {
        GridConnection {
            import_limit_kw: self.grid_import_limit_kw,
            export_limit_kw: self.grid_export_limit_kw,
        }
    }

    /// Export tariff in GBP/kWh.
    pub fn export_price(&self) -> f64 {
        pence_to_pounds(self.export_price_pence)
    }
}

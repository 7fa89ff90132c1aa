use chrono::Duration;
use tracing::warn;

use super::OptimizerSettings;
use crate::domain::{validate_series, BatteryConfig, GridConnection, Interval};
use crate::error::ValidationError;

/// Per-run limits in energy units, derived once from validated inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConstraints {
    /// `demand - solar` per interval (kWh).
    pub net_demand_kwh: Vec<f64>,
    pub import_price: Vec<f64>,
    pub export_price: Vec<f64>,
    pub soc_min_kwh: f64,
    pub soc_max_kwh: f64,
    pub initial_soc_kwh: f64,
    pub max_charge_kwh: f64,
    pub max_discharge_kwh: f64,
    pub max_import_kwh: Option<f64>,
    pub max_export_kwh: Option<f64>,
}

impl DispatchConstraints {
    pub fn build(
        intervals: &[Interval],
        battery: &BatteryConfig,
        grid: &GridConnection,
        settings: &OptimizerSettings,
    ) -> Result<Self, ValidationError> {
        settings.validate()?;
        battery.validate_limits()?;
        grid.validate()?;

        let battery = if settings.clamp_initial_soc && !battery.is_soc_valid(battery.initial_soc_pct) {
            let clamped = battery.clamped();
            warn!(
                requested = battery.initial_soc_pct,
                clamped = clamped.initial_soc_pct,
                "initial SOC outside the usable window, clamping"
            );
            clamped
        } else {
            battery.clone()
        };
        battery.validate()?;

        let slot = Duration::minutes(settings.interval_minutes);
        validate_series(intervals, slot)?;

        if grid.is_unlimited() {
            if let Some((index, interval)) = intervals
                .iter()
                .enumerate()
                .find(|(_, i)| i.export_price > i.import_price)
            {
                return Err(ValidationError::UnboundedArbitrage {
                    index,
                    import_price: interval.import_price,
                    export_price: interval.export_price,
                });
            }
        }

        let duration_h = settings.interval_hours();

        Ok(Self {
            net_demand_kwh: intervals.iter().map(Interval::net_demand_kwh).collect(),
            import_price: intervals.iter().map(|i| i.import_price).collect(),
            export_price: intervals.iter().map(|i| i.export_price).collect(),
            soc_min_kwh: battery.min_soc_kwh(),
            soc_max_kwh: battery.max_soc_kwh(),
            initial_soc_kwh: battery.initial_soc_kwh(),
            max_charge_kwh: battery.charge_power_kw * duration_h,
            max_discharge_kwh: battery.discharge_power_kw * duration_h,
            max_import_kwh: grid.import_limit_kw.map(|kw| kw * duration_h),
            max_export_kwh: grid.export_limit_kw.map(|kw| kw * duration_h),
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.net_demand_kwh.len()
    }

    pub fn can_charge(&self) -> bool {
        self.max_charge_kwh > 0.0
    }

    pub fn can_discharge(&self) -> bool {
        self.max_discharge_kwh > 0.0
    }

    /// Net cost of one interval's grid flows.
    pub fn interval_cost(&self, index: usize, import_kwh: f64, export_kwh: f64) -> f64 {
        self.import_price[index] * import_kwh - self.export_price[index] * export_kwh
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Net battery flow below this is reported as idle (kWh).
const ACTION_DEAD_BAND_KWH: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Charge,
    Discharge,
    Idle,
}

impl Action {
    pub fn from_net_battery_kwh(net_kwh: f64) -> Self {
        if net_kwh > ACTION_DEAD_BAND_KWH {
            Self::Charge
        } else if net_kwh < -ACTION_DEAD_BAND_KWH {
            Self::Discharge
        } else {
            Self::Idle
        }
    }
}

/// One optimised row, aligned 1:1 with an input interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub period_end: DateTime<Utc>,
    pub solar_kwh: f64,
    pub demand_kwh: f64,
    pub import_price: f64,
    pub export_price: f64,
    pub batt_charge_kwh: f64,
    pub batt_discharge_kwh: f64,
    pub grid_import_kwh: f64,
    pub grid_export_kwh: f64,
    /// State of charge at the end of the interval.
    pub soc_kwh: f64,
    pub soc_pct: f64,
    pub net_battery_kwh: f64,
    pub net_grid_kwh: f64,
    /// Import cost minus export revenue.
    pub cost_gbp: f64,
    pub action: Action,
}

impl ScheduleEntry {
    /// `solar + discharge + import - (demand + charge + export)`, zero for a balanced row.
    pub fn balance_residual_kwh(&self) -> f64 {
        self.solar_kwh + self.batt_discharge_kwh + self.grid_import_kwh
            - self.demand_kwh
            - self.batt_charge_kwh
            - self.grid_export_kwh
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub total_cost_gbp: f64,
    pub total_solar_kwh: f64,
    pub total_demand_kwh: f64,
    pub total_grid_import_kwh: f64,
    pub total_grid_export_kwh: f64,
    pub total_charge_kwh: f64,
    pub total_discharge_kwh: f64,
    pub final_soc_pct: f64,
    /// Cost of the same horizon with the battery left idle.
    pub baseline_cost_gbp: f64,
    pub savings_gbp: f64,
}

impl DispatchSummary {
    pub fn from_entries(entries: &[ScheduleEntry], baseline_cost_gbp: f64) -> Self {
        let total = |f: fn(&ScheduleEntry) -> f64| entries.iter().map(f).sum::<f64>();
        let total_cost_gbp = total(|e| e.cost_gbp);

        Self {
            total_cost_gbp,
            total_solar_kwh: total(|e| e.solar_kwh),
            total_demand_kwh: total(|e| e.demand_kwh),
            total_grid_import_kwh: total(|e| e.grid_import_kwh),
            total_grid_export_kwh: total(|e| e.grid_export_kwh),
            total_charge_kwh: total(|e| e.batt_charge_kwh),
            total_discharge_kwh: total(|e| e.batt_discharge_kwh),
            final_soc_pct: entries.last().map_or(0.0, |e| e.soc_pct),
            baseline_cost_gbp,
            savings_gbp: baseline_cost_gbp - total_cost_gbp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSchedule {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Start of the first interval.
    pub valid_from: DateTime<Utc>,
    /// End of the last interval.
    pub valid_until: DateTime<Utc>,
    pub entries: Vec<ScheduleEntry>,
    pub summary: DispatchSummary,
    pub optimizer_version: String,
}

impl DispatchSchedule {
    /// Entry whose interval contains `t`, intervals being half-open `(start, period_end]`.
    pub fn entry_at(&self, t: DateTime<Utc>) -> Option<&ScheduleEntry> {
        if t <= self.valid_from || t > self.valid_until {
            return None;
        }
        self.entries.iter().find(|e| t <= e.period_end)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

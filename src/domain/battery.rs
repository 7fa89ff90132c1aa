use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Static battery parameters for one optimisation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    pub capacity_kwh: f64,
    pub initial_soc_pct: f64,
    pub min_soc_pct: f64,
    pub max_soc_pct: f64,
    /// Maximum charge power (kW). Zero disables charging.
    pub charge_power_kw: f64,
    /// Maximum discharge power (kW). Zero disables discharging.
    pub discharge_power_kw: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 5.0,
            initial_soc_pct: 50.0,
            min_soc_pct: 20.0,
            max_soc_pct: 100.0,
            charge_power_kw: 3.0,
            discharge_power_kw: 3.0,
        }
    }
}

impl BatteryConfig {
    /// Validate everything except where the initial SOC sits in the window.
    pub fn validate_limits(&self) -> Result<(), ValidationError> {
        if !self.capacity_kwh.is_finite() || self.capacity_kwh <= 0.0 {
            return Err(invalid("capacity_kwh", format!("must be positive, got {}", self.capacity_kwh)));
        }

        for (field, pct) in [
            ("min_soc_pct", self.min_soc_pct),
            ("max_soc_pct", self.max_soc_pct),
            ("initial_soc_pct", self.initial_soc_pct),
        ] {
            if !(0.0..=100.0).contains(&pct) {
                return Err(invalid(field, format!("must be between 0 and 100, got {pct}")));
            }
        }

        if self.min_soc_pct >= self.max_soc_pct {
            return Err(invalid(
                "min_soc_pct",
                format!(
                    "must be below max_soc_pct ({} >= {})",
                    self.min_soc_pct, self.max_soc_pct
                ),
            ));
        }

        for (field, power) in [
            ("charge_power_kw", self.charge_power_kw),
            ("discharge_power_kw", self.discharge_power_kw),
        ] {
            if !power.is_finite() || power < 0.0 {
                return Err(invalid(field, format!("must be non-negative, got {power}")));
            }
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_limits()?;
        if !self.is_soc_valid(self.initial_soc_pct) {
            return Err(invalid(
                "initial_soc_pct",
                format!(
                    "must lie within [{}, {}], got {}",
                    self.min_soc_pct, self.max_soc_pct, self.initial_soc_pct
                ),
            ));
        }
        Ok(())
    }

    pub fn is_soc_valid(&self, soc_pct: f64) -> bool {
        soc_pct >= self.min_soc_pct && soc_pct <= self.max_soc_pct
    }

    /// Copy with the initial SOC moved into the usable window.
    pub fn clamped(&self) -> Self {
        Self {
            initial_soc_pct: self.initial_soc_pct.clamp(self.min_soc_pct, self.max_soc_pct),
            ..self.clone()
        }
    }

    pub fn pct_to_kwh(&self, pct: f64) -> f64 {
        pct / 100.0 * self.capacity_kwh
    }

    pub fn kwh_to_pct(&self, kwh: f64) -> f64 {
        kwh / self.capacity_kwh * 100.0
    }

    pub fn min_soc_kwh(&self) -> f64 {
        self.pct_to_kwh(self.min_soc_pct)
    }

    pub fn max_soc_kwh(&self) -> f64 {
        self.pct_to_kwh(self.max_soc_pct)
    }

    pub fn initial_soc_kwh(&self) -> f64 {
        self.pct_to_kwh(self.initial_soc_pct)
    }
}

fn invalid(field: &'static str, reason: String) -> ValidationError {
    ValidationError::Battery { field, reason }
}

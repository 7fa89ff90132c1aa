use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default slot length of the horizon.
pub const HALF_HOUR_MINUTES: i64 = 30;

/// One fixed-length slot of the optimisation horizon, in energy and currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// End of the slot.
    pub period_end: DateTime<Utc>,
    /// Forecast solar energy available in the slot (kWh).
    pub solar_kwh: f64,
    /// Forecast household consumption in the slot (kWh).
    pub demand_kwh: f64,
    /// Cost of grid import (currency/kWh).
    pub import_price: f64,
    /// Revenue of grid export (currency/kWh).
    pub export_price: f64,
}

impl Interval {
    pub fn new(
        period_end: DateTime<Utc>,
        solar_kwh: f64,
        demand_kwh: f64,
        import_price: f64,
        export_price: f64,
    ) -> Self {
        Self {
            period_end,
            solar_kwh,
            demand_kwh,
            import_price,
            export_price,
        }
    }

    /// Demand left over after solar, positive when the house needs energy.
    pub fn net_demand_kwh(&self) -> f64 {
        self.demand_kwh - self.solar_kwh
    }

    /// Overwrite every export price with one flat tariff.
    pub fn broadcast_export_price(intervals: &mut [Interval], export_price: f64) {
        for interval in intervals {
            interval.export_price = export_price;
        }
    }
}

/// Check that a series is non-empty, contiguous at `slot` spacing, and carries
/// finite non-negative energy and finite prices.
pub fn validate_series(intervals: &[Interval], slot: Duration) -> Result<(), ValidationError> {
    if intervals.is_empty() {
        return Err(ValidationError::EmptySeries);
    }

    for (index, interval) in intervals.iter().enumerate() {
        check_energy(index, "solar_kwh", interval.solar_kwh)?;
        check_energy(index, "demand_kwh", interval.demand_kwh)?;
        check_finite(index, "import_price", interval.import_price)?;
        check_finite(index, "export_price", interval.export_price)?;
    }

    for (index, (prev, next)) in intervals.iter().tuple_windows().enumerate() {
        let step = next.period_end - prev.period_end;
        if step <= Duration::zero() {
            return Err(ValidationError::Unordered { index: index + 1 });
        }
        if step != slot {
            return Err(ValidationError::Gap {
                index: index + 1,
                expected_minutes: slot.num_minutes(),
                actual_minutes: step.num_minutes(),
            });
        }
    }

    Ok(())
}

fn check_energy(index: usize, field: &'static str, value: f64) -> Result<(), ValidationError> {
    check_finite(index, field, value)?;
    if value < 0.0 {
        return Err(ValidationError::Interval {
            index,
            field,
            reason: format!("must be non-negative, got {value}"),
        });
    }
    Ok(())
}

fn check_finite(index: usize, field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::Interval {
            index,
            field,
            reason: format!("must be finite, got {value}"),
        });
    }
    Ok(())
}

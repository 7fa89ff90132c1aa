use serde::{Deserialize, Serialize};

use crate::domain::{BatteryConfig, DispatchSchedule, GridConnection, Interval, HALF_HOUR_MINUTES};
use crate::error::{DispatchError, ValidationError};

/// Tunables shared by every strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Length of one interval in minutes.
    pub interval_minutes: i64,
    /// Run the throughput-minimising second stage after the cost solve.
    pub tie_break: bool,
    /// Relative cost slack granted to the second stage.
    pub cost_tolerance: f64,
    /// Clamp an out-of-window initial SOC instead of rejecting the request.
    pub clamp_initial_soc: bool,
    /// Wall-clock budget for one solve when run through the service.
    pub solve_timeout_seconds: u64,
    /// Horizon length above which a warning is logged.
    pub max_intervals_warning: usize,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            interval_minutes: HALF_HOUR_MINUTES,
            tie_break: true,
            cost_tolerance: 1e-7,
            clamp_initial_soc: false,
            solve_timeout_seconds: 30,
            max_intervals_warning: 96,
        }
    }
}

impl OptimizerSettings {
    pub fn interval_hours(&self) -> f64 {
        self.interval_minutes as f64 / 60.0
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval_minutes <= 0 {
            return Err(ValidationError::Settings {
                field: "interval_minutes",
                reason: format!("must be positive, got {}", self.interval_minutes),
            });
        }
        if !self.cost_tolerance.is_finite() || self.cost_tolerance < 0.0 {
            return Err(ValidationError::Settings {
                field: "cost_tolerance",
                reason: format!("must be non-negative, got {}", self.cost_tolerance),
            });
        }
        Ok(())
    }
}

/// A way of turning one forecast horizon into a dispatch schedule.
///
/// Implementations hold no per-run state, so one instance may serve
/// concurrent calls from several threads.
pub trait OptimizationStrategy: Send + Sync {
    fn optimize(
        &self,
        intervals: &[Interval],
        battery: &BatteryConfig,
        grid: &GridConnection,
    ) -> Result<DispatchSchedule, DispatchError>;

    fn version(&self) -> &'static str;
}

pub struct DispatchOptimizer {
    pub strategy: Box<dyn OptimizationStrategy>,
}

impl DispatchOptimizer {
    pub fn new(strategy: impl OptimizationStrategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
        }
    }

    pub fn optimize(
        &self,
        intervals: &[Interval],
        battery: &BatteryConfig,
        grid: &GridConnection,
    ) -> Result<DispatchSchedule, DispatchError> {
        self.strategy.optimize(intervals, battery, grid)
    }

    pub fn version(&self) -> &'static str {
        self.strategy.version()
    }
}

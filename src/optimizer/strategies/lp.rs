//! Linear-programming dispatch.
//!
//! Per interval `i` the model carries battery charge and discharge, grid
//! import and export, and the end-of-interval SOC, all in kWh:
//! - box bounds: SOC window, per-interval power limits, optional grid limits,
//!   non-negative flows
//! - equalities: `discharge + import - charge - export = demand - solar` and
//!   `soc[i] = soc[i-1] + charge - discharge`, seeded with the initial SOC
//! - objective: `sum(import_price * import - export_price * export)`
//!
//! The zero-loss battery leaves many schedules at the same cost. A second
//! stage minimises total energy throughput with the cost pinned at the
//! optimum, which rules out simultaneous charge/discharge and
//! import/export unless they lower the cost.

use std::time::Instant;

use chrono::{Duration, Utc};
use good_lp::{
    clarabel, constraint, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    Action, BatteryConfig, DispatchSchedule, DispatchSummary, GridConnection, Interval,
    ScheduleEntry,
};
use crate::error::DispatchError;
use crate::optimizer::{grid_only_cost, DispatchConstraints, OptimizationStrategy, OptimizerSettings};

pub const LP_OPTIMIZER_VERSION: &str = "lp-v1.0";

/// Solver values below this are treated as zero (kWh).
const SNAP_KWH: f64 = 1e-8;

/// Allowed drift between the re-derived schedule cost and the solved optimum.
const COST_CONSISTENCY_TOLERANCE: f64 = 1e-6;

/// Exact dispatch via linear programming on the clarabel backend.
#[derive(Debug, Clone, Default)]
pub struct LpOptimizer {
    settings: OptimizerSettings,
}

impl LpOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        Self { settings }
    }

    /// Re-solve for minimum throughput at (almost) the optimal cost.
    fn tie_break(&self, c: &DispatchConstraints, optimum: RawDispatch, optimal_cost: f64) -> RawDispatch {
        let cost_bound = optimal_cost + self.settings.cost_tolerance * (1.0 + optimal_cost.abs());
        match solve_stage(c, Objective::MinimiseThroughput { cost_bound }) {
            Ok(canonical) => {
                debug!(
                    throughput_before = optimum.throughput(),
                    throughput_after = canonical.throughput(),
                    "tie-break stage solved"
                );
                canonical
            }
            Err(err) => {
                warn!(error = %err, "tie-break stage failed, keeping the cost-stage optimum");
                optimum
            }
        }
    }

    fn build_schedule(
        &self,
        intervals: &[Interval],
        battery: &BatteryConfig,
        c: &DispatchConstraints,
        raw: &RawDispatch,
    ) -> DispatchSchedule {
        let entries: Vec<ScheduleEntry> = intervals
            .iter()
            .enumerate()
            .map(|(i, interval)| {
                let charge = snap(raw.charge[i]);
                let discharge = snap(raw.discharge[i]);
                let import = snap(raw.import[i]);
                let export = snap(raw.export[i]);
                let soc_kwh = raw.soc[i].clamp(c.soc_min_kwh, c.soc_max_kwh);

                ScheduleEntry {
                    period_end: interval.period_end,
                    solar_kwh: interval.solar_kwh,
                    demand_kwh: interval.demand_kwh,
                    import_price: interval.import_price,
                    export_price: interval.export_price,
                    batt_charge_kwh: charge,
                    batt_discharge_kwh: discharge,
                    grid_import_kwh: import,
                    grid_export_kwh: export,
                    soc_kwh,
                    soc_pct: battery.kwh_to_pct(soc_kwh),
                    net_battery_kwh: charge - discharge,
                    net_grid_kwh: import - export,
                    cost_gbp: c.interval_cost(i, import, export),
                    action: Action::from_net_battery_kwh(charge - discharge),
                }
            })
            .collect();

        let summary = DispatchSummary::from_entries(&entries, grid_only_cost(intervals));

        let now = Utc::now();
        let slot = Duration::minutes(self.settings.interval_minutes);
        let valid_from = intervals.first().map_or(now, |i| i.period_end - slot);
        let valid_until = intervals.last().map_or(now, |i| i.period_end);

        DispatchSchedule {
            id: Uuid::new_v4(),
            created_at: now,
            valid_from,
            valid_until,
            entries,
            summary,
            optimizer_version: self.version().to_string(),
        }
    }
}

impl OptimizationStrategy for LpOptimizer {
    #[instrument(name = "lp_optimize", skip_all, fields(intervals = intervals.len()))]
    fn optimize(
        &self,
        intervals: &[Interval],
        battery: &BatteryConfig,
        grid: &GridConnection,
    ) -> Result<DispatchSchedule, DispatchError> {
        let c = DispatchConstraints::build(intervals, battery, grid, &self.settings)?;

        if c.len() > self.settings.max_intervals_warning {
            warn!(
                intervals = c.len(),
                limit = self.settings.max_intervals_warning,
                "horizon is longer than expected, solve time grows with it"
            );
        }

        let started = Instant::now();
        let optimum = solve_stage(&c, Objective::MinimiseCost).map_err(to_dispatch_error)?;
        let optimal_cost = optimum.cost(&c);
        debug!(optimal_cost, "cost stage solved");

        let raw = if self.settings.tie_break {
            self.tie_break(&c, optimum, optimal_cost)
        } else {
            optimum
        };

        let schedule = self.build_schedule(intervals, battery, &c, &raw);
        let total_cost = schedule.summary.total_cost_gbp;
        if (total_cost - optimal_cost).abs() > COST_CONSISTENCY_TOLERANCE * (1.0 + optimal_cost.abs()) {
            warn!(
                total_cost,
                optimal_cost, "schedule cost drifted from the solved optimum"
            );
        }

        info!(
            total_cost,
            savings = schedule.summary.savings_gbp,
            final_soc_pct = schedule.summary.final_soc_pct,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dispatch schedule optimised"
        );
        Ok(schedule)
    }

    fn version(&self) -> &'static str {
        LP_OPTIMIZER_VERSION
    }
}

enum Objective {
    MinimiseCost,
    MinimiseThroughput { cost_bound: f64 },
}

/// Decision variables of one model. Battery flows are absent when the
/// corresponding power limit is zero.
struct DispatchVariables {
    charge: Option<Vec<Variable>>,
    discharge: Option<Vec<Variable>>,
    import: Vec<Variable>,
    export: Vec<Variable>,
    soc: Vec<Variable>,
}

impl DispatchVariables {
    fn declare(problem: &mut ProblemVariables, c: &DispatchConstraints) -> Self {
        let n = c.len();
        let charge = c
            .can_charge()
            .then(|| problem.add_vector(variable().min(0.0).max(c.max_charge_kwh), n));
        let discharge = c
            .can_discharge()
            .then(|| problem.add_vector(variable().min(0.0).max(c.max_discharge_kwh), n));
        let import = match c.max_import_kwh {
            Some(max) => problem.add_vector(variable().min(0.0).max(max), n),
            None => problem.add_vector(variable().min(0.0), n),
        };
        let export = match c.max_export_kwh {
            Some(max) => problem.add_vector(variable().min(0.0).max(max), n),
            None => problem.add_vector(variable().min(0.0), n),
        };
        let soc = problem.add_vector(variable().min(c.soc_min_kwh).max(c.soc_max_kwh), n);

        Self {
            charge,
            discharge,
            import,
            export,
            soc,
        }
    }

    fn cost(&self, c: &DispatchConstraints) -> Expression {
        (0..c.len())
            .map(|i| c.import_price[i] * self.import[i] - c.export_price[i] * self.export[i])
            .sum()
    }

    fn throughput(&self) -> Expression {
        self.import
            .iter()
            .chain(&self.export)
            .chain(self.charge.iter().flatten())
            .chain(self.discharge.iter().flatten())
            .map(|&v| Expression::from(v))
            .sum()
    }

    /// `discharge + import - charge - export` of interval `i`.
    fn net_supply(&self, i: usize) -> Expression {
        let mut supply = Expression::from(self.import[i]);
        supply -= self.export[i];
        if let Some(discharge) = &self.discharge {
            supply += discharge[i];
        }
        if let Some(charge) = &self.charge {
            supply -= charge[i];
        }
        supply
    }

    /// `soc[i] - soc[i-1] - charge + discharge`, with `soc[-1]` moved to the right-hand side.
    fn soc_step(&self, i: usize) -> Expression {
        let mut step = Expression::from(self.soc[i]);
        if i > 0 {
            step -= self.soc[i - 1];
        }
        if let Some(charge) = &self.charge {
            step -= charge[i];
        }
        if let Some(discharge) = &self.discharge {
            step += discharge[i];
        }
        step
    }

    fn extract<S: Solution>(&self, solution: &S) -> RawDispatch {
        let n = self.soc.len();
        let values = |vars: &[Variable]| vars.iter().map(|&v| solution.value(v)).collect::<Vec<f64>>();
        RawDispatch {
            charge: self.charge.as_deref().map_or_else(|| vec![0.0; n], values),
            discharge: self.discharge.as_deref().map_or_else(|| vec![0.0; n], values),
            import: values(&self.import),
            export: values(&self.export),
            soc: values(&self.soc),
        }
    }
}

/// Unrounded solver output.
struct RawDispatch {
    charge: Vec<f64>,
    discharge: Vec<f64>,
    import: Vec<f64>,
    export: Vec<f64>,
    soc: Vec<f64>,
}

impl RawDispatch {
    fn cost(&self, c: &DispatchConstraints) -> f64 {
        (0..c.len())
            .map(|i| c.interval_cost(i, self.import[i], self.export[i]))
            .sum()
    }

    fn throughput(&self) -> f64 {
        [&self.charge, &self.discharge, &self.import, &self.export]
            .iter()
            .flat_map(|flows| flows.iter())
            .sum()
    }
}

fn with_dispatch_constraints<M: SolverModel>(
    mut model: M,
    vars: &DispatchVariables,
    c: &DispatchConstraints,
) -> M {
    for i in 0..c.len() {
        let soc_rhs = if i == 0 { c.initial_soc_kwh } else { 0.0 };
        model = model
            .with(constraint!(vars.net_supply(i) == c.net_demand_kwh[i]))
            .with(constraint!(vars.soc_step(i) == soc_rhs));
    }
    model
}

fn solve_stage(c: &DispatchConstraints, objective: Objective) -> Result<RawDispatch, ResolutionError> {
    let mut problem = ProblemVariables::new();
    let vars = DispatchVariables::declare(&mut problem, c);

    let model = match objective {
        Objective::MinimiseCost => problem.minimise(vars.cost(c)).using(clarabel),
        Objective::MinimiseThroughput { cost_bound } => problem
            .minimise(vars.throughput())
            .using(clarabel)
            .with(constraint!(vars.cost(c) <= cost_bound)),
    };

    let solution = with_dispatch_constraints(model, &vars, c).solve()?;
    Ok(vars.extract(&solution))
}

fn to_dispatch_error(err: ResolutionError) -> DispatchError {
    match err {
        ResolutionError::Infeasible => DispatchError::Infeasible {
            reason: "the solver proved the constraint set infeasible, check the grid limits".to_string(),
        },
        ResolutionError::Unbounded => DispatchError::solver("the objective is unbounded"),
        other => DispatchError::solver(other.to_string()),
    }
}

fn snap(kwh: f64) -> f64 {
    if kwh < SNAP_KWH {
        0.0
    } else {
        kwh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn interval(k: i64, solar: f64, demand: f64, price: f64) -> Interval {
        let start = Utc.with_ymd_and_hms(2025, 9, 20, 0, 0, 0).unwrap();
        Interval::new(start + Duration::minutes(30 * k), solar, demand, price, 0.05)
    }

    #[test]
    fn test_snap() {
        assert_eq!(snap(-1e-12), 0.0);
        assert_eq!(snap(5e-9), 0.0);
        assert_eq!(snap(0.25), 0.25);
    }

    #[test]
    fn test_resolution_error_mapping() {
        assert!(matches!(
            to_dispatch_error(ResolutionError::Infeasible),
            DispatchError::Infeasible { .. }
        ));
        assert!(matches!(
            to_dispatch_error(ResolutionError::Unbounded),
            DispatchError::Solver { .. }
        ));
    }

    #[test]
    fn test_single_interval_sells_down_battery() {
        let optimizer = LpOptimizer::default();
        // 2.5 kWh stored, 1.0 kWh floor, 1.5 kWh per interval discharge limit.
        let battery = BatteryConfig::default();
        let schedule = optimizer
            .optimize(&[interval(1, 0.0, 1.0, 0.2)], &battery, &GridConnection::unlimited())
            .unwrap();

        // Stored energy has no value past the horizon: cover demand, export the rest.
        let entry = &schedule.entries[0];
        assert!((entry.batt_discharge_kwh - 1.5).abs() < 1e-5);
        assert!((entry.grid_export_kwh - 0.5).abs() < 1e-5);
        assert!(entry.grid_import_kwh.abs() < 1e-5);
        assert!((entry.soc_kwh - 1.0).abs() < 1e-5);
        assert_eq!(entry.action, Action::Discharge);
        assert_eq!(schedule.optimizer_version, optimizer.version());
        assert_eq!(schedule.valid_until - schedule.valid_from, Duration::minutes(30));
    }

    #[test]
    fn test_validation_precedes_solve() {
        let optimizer = LpOptimizer::default();
        let err = optimizer
            .optimize(&[], &BatteryConfig::default(), &GridConnection::unlimited())
            .unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }
}

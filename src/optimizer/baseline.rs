//! Grid-only reference: what the horizon costs with the battery left idle.
//!
//! Used to report savings next to the optimised schedule. Grid limits are
//! ignored here, so the figure is a reference price rather than a schedule.

use crate::domain::Interval;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOnlyFlow {
    pub import_kwh: f64,
    pub export_kwh: f64,
    pub cost: f64,
}

impl GridOnlyFlow {
    pub fn for_interval(interval: &Interval) -> Self {
        let net = interval.net_demand_kwh();
        let import_kwh = net.max(0.0);
        let export_kwh = (-net).max(0.0);
        Self {
            import_kwh,
            export_kwh,
            cost: interval.import_price * import_kwh - interval.export_price * export_kwh,
        }
    }
}

pub fn grid_only_cost(intervals: &[Interval]) -> f64 {
    intervals
        .iter()
        .map(|i| GridOnlyFlow::for_interval(i).cost)
        .sum()
}

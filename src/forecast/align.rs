use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarPoint {
    pub period_end: DateTime<Utc>,
    pub solar_kwh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub period_end: DateTime<Utc>,
    /// Import price (currency/kWh).
    pub import_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandPoint {
    pub period_end: DateTime<Utc>,
    pub demand_kwh: f64,
}

/// Inner-join separately acquired series on `period_end`, ascending.
///
/// Slots missing from any input are dropped rather than filled; later
/// duplicates of a timestamp win. The result still has to pass validation,
/// so a dropped slot in the middle of the horizon surfaces as a gap.
pub fn join_series(
    solar: &[SolarPoint],
    prices: &[PricePoint],
    demand: &[DemandPoint],
    export_price: f64,
) -> Vec<Interval> {
    let prices: HashMap<_, _> = prices.iter().map(|p| (p.period_end, p.import_price)).collect();
    let demand: HashMap<_, _> = demand.iter().map(|d| (d.period_end, d.demand_kwh)).collect();
    let solar: BTreeMap<_, _> = solar.iter().map(|s| (s.period_end, s.solar_kwh)).collect();

    let joined: Vec<Interval> = solar
        .iter()
        .filter_map(|(period_end, solar_kwh)| {
            let import_price = prices.get(period_end)?;
            let demand_kwh = demand.get(period_end)?;
            Some(Interval::new(*period_end, *solar_kwh, *demand_kwh, *import_price, export_price))
        })
        .collect();

    debug!(
        solar = solar.len(),
        prices = prices.len(),
        demand = demand.len(),
        joined = joined.len(),
        "joined forecast series"
    );
    joined
}

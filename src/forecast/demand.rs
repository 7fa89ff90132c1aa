//! Naive demand forecast: average recent load by half-hour of day.

use chrono::{DateTime, Timelike, Utc};
use tracing::debug;

use super::DemandPoint;

pub const SLOTS_PER_DAY: usize = 48;

/// Energy assumed for a slot with no history (kWh).
pub const DEFAULT_SLOT_DEMAND_KWH: f64 = 0.5;

/// Expected demand per half-hour-of-day slot, in kWh per slot.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandProfile {
    slots: [Option<f64>; SLOTS_PER_DAY],
}

impl Default for DemandProfile {
    fn default() -> Self {
        Self {
            slots: [None; SLOTS_PER_DAY],
        }
    }
}

/// Half-hour-of-day slot a timestamp falls on.
pub fn slot_of(t: DateTime<Utc>) -> usize {
    (t.hour() * 2 + t.minute() / 30) as usize
}

impl DemandProfile {
    /// Build from load power samples `(timestamp, kW)`.
    ///
    /// Samples are averaged per slot and converted to energy over half an
    /// hour. Non-finite samples are skipped.
    pub fn from_load_history(samples: &[(DateTime<Utc>, f64)]) -> Self {
        let mut sums = [0.0_f64; SLOTS_PER_DAY];
        let mut counts = [0_u32; SLOTS_PER_DAY];

        for (t, kw) in samples.iter().filter(|(_, kw)| kw.is_finite()) {
            let slot = slot_of(*t);
            sums[slot] += kw;
            counts[slot] += 1;
        }

        let mut profile = Self::default();
        for slot in 0..SLOTS_PER_DAY {
            if counts[slot] > 0 {
                let avg_kw = sums[slot] / f64::from(counts[slot]);
                profile.slots[slot] = Some((avg_kw * 0.5).max(0.0));
            }
        }

        debug!(
            samples = samples.len(),
            covered_slots = profile.slots.iter().filter(|s| s.is_some()).count(),
            "built demand profile"
        );
        profile
    }

    pub fn demand_kwh(&self, slot: usize) -> f64 {
        self.slots
            .get(slot)
            .copied()
            .flatten()
            .unwrap_or(DEFAULT_SLOT_DEMAND_KWH)
    }

    /// Project onto future slot ends.
    pub fn project(&self, period_ends: &[DateTime<Utc>]) -> Vec<DemandPoint> {
        period_ends
            .iter()
            .map(|&period_end| DemandPoint {
                period_end,
                demand_kwh: self.demand_kwh(slot_of(period_end)),
            })
            .collect()
    }
}

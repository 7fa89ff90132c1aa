//! Forecast collaborator seam.
//!
//! The optimiser only consumes an aligned [`Interval`] series. Providers
//! resolve an opaque forecast id into that series, already in kWh and
//! currency/kWh.

pub mod align;
pub mod components;
pub mod demand;
pub mod file;

pub use align::*;
pub use components::*;
pub use demand::*;
pub use file::*;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::Interval;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Aligned series for `forecast_id` (or the provider's default), with
    /// `export_price` (currency/kWh) filled in where the source has none.
    async fn intervals(&self, forecast_id: Option<String>, export_price: f64) -> Result<Vec<Interval>>;
}

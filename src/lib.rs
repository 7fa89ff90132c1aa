//! Home battery dispatch optimiser.
//!
//! Turns a half-hourly forecast of solar generation, household demand and
//! grid prices into a cost-minimal charge/discharge schedule by solving a
//! linear program.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod optimizer;
pub mod telemetry;

pub use error::{DispatchError, ErrorKind, ValidationError};

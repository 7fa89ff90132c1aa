//! Transport-agnostic request/response contract around the optimiser.
//!
//! Prices cross this boundary in pence/kWh and are converted to GBP/kWh
//! before they reach the optimiser.

pub mod error;
pub mod request;
pub mod response;
pub mod service;

pub use error::ApiError;
pub use request::OptimiseRequest;
pub use response::{ErrorResponse, OptimiseResponse};
pub use service::DispatchService;

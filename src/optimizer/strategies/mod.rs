//! Optimization strategies
//!
//! - LP: linear programming on the clarabel backend (exact, with a
//!   throughput tie-break stage)

pub mod lp;

pub use lp::*;

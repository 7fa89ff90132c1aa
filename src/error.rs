use serde::Serialize;
use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// Wire name of an error category, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
pub enum ErrorKind {
    ValidationError,
    InfeasibleError,
    SolverError,
    ForecastError,
}

/// Failure of one optimisation run. No partial schedule accompanies any variant.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("no feasible schedule: {reason}")]
    Infeasible { reason: String },

    #[error("solver failure: {reason}")]
    Solver { reason: String },
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Infeasible { .. } => ErrorKind::InfeasibleError,
            Self::Solver { .. } => ErrorKind::SolverError,
        }
    }

    pub fn solver(reason: impl Into<String>) -> Self {
        Self::Solver {
            reason: reason.into(),
        }
    }
}

/// Rejected input, detected before any solve is attempted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("interval series is empty")]
    EmptySeries,

    #[error("battery {field} {reason}")]
    Battery { field: &'static str, reason: String },

    #[error("grid {field} {reason}")]
    Grid { field: &'static str, reason: String },

    #[error("interval {index}: {field} {reason}")]
    Interval {
        index: usize,
        field: &'static str,
        reason: String,
    },

    #[error("interval {index}: period_end is not after the previous interval")]
    Unordered { index: usize },

    #[error("interval {index}: expected {expected_minutes} min after the previous interval, found {actual_minutes} min")]
    Gap {
        index: usize,
        expected_minutes: i64,
        actual_minutes: i64,
    },

    #[error("interval {index}: export price {export_price} exceeds import price {import_price} with no grid limit, the cost is unbounded")]
    UnboundedArbitrage {
        index: usize,
        import_price: f64,
        export_price: f64,
    },

    #[error("settings {field} {reason}")]
    Settings { field: &'static str, reason: String },
}

impl ValidationError {
    /// Name of the offending field, where one applies.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Battery { field, .. }
            | Self::Grid { field, .. }
            | Self::Interval { field, .. }
            | Self::Settings { field, .. } => Some(field),
            Self::Unordered { .. } | Self::Gap { .. } => Some("period_end"),
            Self::UnboundedArbitrage { .. } => Some("export_price"),
            Self::EmptySeries => None,
        }
    }

    /// Index of the offending interval, where one applies.
    pub fn interval_index(&self) -> Option<usize> {
        match self {
            Self::Interval { index, .. }
            | Self::Unordered { index }
            | Self::Gap { index, .. }
            | Self::UnboundedArbitrage { index, .. } => Some(*index),
            _ => None,
        }
    }
}

use std::time::Duration;

use thiserror::Error;

use super::response::ErrorResponse;
use crate::error::{DispatchError, ErrorKind};

/// Every way a service call can fail.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Request(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("forecast unavailable: {0:#}")]
    Forecast(anyhow::Error),

    #[error("solver failure: no result within {0:?}")]
    Timeout(Duration),

    #[error("solver failure: solve task aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Request(_) => ErrorKind::ValidationError,
            ApiError::Dispatch(e) => e.kind(),
            ApiError::Forecast(_) => ErrorKind::ForecastError,
            ApiError::Timeout(_) | ApiError::Task(_) => ErrorKind::SolverError,
        }
    }

    pub fn field(&self) -> Option<String> {
        match self {
            // Lowest name first so the report is stable across runs.
            ApiError::Request(errors) => errors.field_errors().keys().min().map(|k| k.to_string()),
            ApiError::Dispatch(DispatchError::Validation(e)) => e.field().map(str::to_string),
            _ => None,
        }
    }

    pub fn interval_index(&self) -> Option<usize> {
        match self {
            ApiError::Dispatch(DispatchError::Validation(e)) => e.interval_index(),
            _ => None,
        }
    }

    /// Log at the severity of the failure and render it for the caller.
    pub fn to_response(&self) -> ErrorResponse {
        match self.kind() {
            ErrorKind::SolverError => tracing::error!(error = %self, "optimisation failed"),
            ErrorKind::InfeasibleError | ErrorKind::ForecastError => {
                tracing::warn!(error = %self, "optimisation rejected")
            }
            ErrorKind::ValidationError => tracing::debug!(error = %self, "invalid input"),
        }

        ErrorResponse {
            kind: self.kind(),
            message: self.to_string(),
            field: self.field(),
            interval_index: self.interval_index(),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DispatchSchedule, DispatchSummary, ScheduleEntry};
use crate::error::ErrorKind;

/// Successful optimisation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimiseResponse {
    /// Always `"success"`.
    pub status: String,
    pub generated_at: DateTime<Utc>,
    pub summary: DispatchSummary,
    pub schedule: Vec<ScheduleEntry>,
}

impl From<DispatchSchedule> for OptimiseResponse {
    fn from(schedule: DispatchSchedule) -> Self {
        Self {
            status: "success".to_string(),
            generated_at: schedule.created_at,
            summary: schedule.summary,
            schedule: schedule.entries,
        }
    }
}

/// Failed optimisation, one per error category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_index: Option<usize>,
}

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Single-phase domestic supply fuse.
pub const HOUSEHOLD_IMPORT_LIMIT_KW: f64 = 15.0;
/// Export cap without a DNO application (G98, 16 A per phase).
pub const HOUSEHOLD_EXPORT_LIMIT_KW: f64 = 3.68;

/// Site connection limits. `None` leaves a direction unlimited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridConnection {
    #[serde(default)]
    pub import_limit_kw: Option<f64>,
    #[serde(default)]
    pub export_limit_kw: Option<f64>,
}

impl GridConnection {
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Typical UK domestic connection. Used when no limits are configured.
    pub fn household() -> Self {
        Self::limited(HOUSEHOLD_IMPORT_LIMIT_KW, HOUSEHOLD_EXPORT_LIMIT_KW)
    }

    pub fn limited(import_limit_kw: f64, export_limit_kw: f64) -> Self {
        Self {
            import_limit_kw: Some(import_limit_kw),
            export_limit_kw: Some(export_limit_kw),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.import_limit_kw.is_none() && self.export_limit_kw.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, limit) in [
            ("import_limit_kw", self.import_limit_kw),
            ("export_limit_kw", self.export_limit_kw),
        ] {
            if let Some(kw) = limit {
                if !kw.is_finite() || kw < 0.0 {
                    return Err(ValidationError::Grid {
                        field,
                        reason: format!("must be non-negative, got {kw}"),
                    });
                }
            }
        }
        Ok(())
    }
}

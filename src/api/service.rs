use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};
use validator::Validate;

use super::{ApiError, OptimiseRequest, OptimiseResponse};
use crate::config::{Config, ForecastSource};
use crate::forecast::{ComponentForecastProvider, FileForecastProvider, ForecastProvider};
use crate::optimizer::{DispatchOptimizer, LpOptimizer};

/// Request-level entry point: resolves the forecast, then solves off the
/// async executor under a wall-clock budget.
#[derive(Clone)]
pub struct DispatchService {
    provider: Arc<dyn ForecastProvider>,
    optimizer: Arc<DispatchOptimizer>,
    timeout: Duration,
}

impl DispatchService {
    pub fn new(provider: Arc<dyn ForecastProvider>, optimizer: DispatchOptimizer, timeout: Duration) -> Self {
        Self {
            provider,
            optimizer: Arc::new(optimizer),
            timeout,
        }
    }

    /// File-backed forecasts and the LP strategy, as configured.
    pub fn from_config(config: &Config) -> Self {
        let forecast = &config.forecast;
        let provider: Arc<dyn ForecastProvider> = match forecast.source {
            ForecastSource::Snapshot => Arc::new(FileForecastProvider::new(&forecast.dir, &forecast.default_id)),
            ForecastSource::Components => {
                Arc::new(ComponentForecastProvider::new(&forecast.dir, &forecast.default_id))
            }
        };
        Self::new(
            provider,
            DispatchOptimizer::new(LpOptimizer::new(config.optimizer.clone())),
            Duration::from_secs(config.optimizer.solve_timeout_seconds),
        )
    }

    #[instrument(skip_all, fields(forecast_id = ?request.forecast_id))]
    pub async fn optimise(&self, request: OptimiseRequest) -> Result<OptimiseResponse, ApiError> {
        request.validate()?;

        let intervals = self
            .provider
            .intervals(request.forecast_id.clone(), request.export_price())
            .await
            .map_err(ApiError::Forecast)?;

        let battery = request.battery();
        let grid = request.grid();
        let optimizer = Arc::clone(&self.optimizer);
        let solve = tokio::task::spawn_blocking(move || optimizer.optimize(&intervals, &battery, &grid));

        let joined = tokio::time::timeout(self.timeout, solve)
            .await
            .map_err(|_| ApiError::Timeout(self.timeout))?;
        let schedule = joined??;

        info!(
            optimizer = self.optimizer.version(),
            intervals = schedule.len(),
            total_cost_gbp = schedule.summary.total_cost_gbp,
            savings_gbp = schedule.summary.savings_gbp,
            "optimisation complete"
        );
        Ok(OptimiseResponse::from(schedule))
    }
}

use anyhow::{Context, Result};
use battery_dispatch::{api::DispatchService, config::Config, telemetry::init_tracing};
use tracing::info;

/// Optimise the configured household over one forecast and print the
/// schedule as JSON. Usage: `battery-dispatch [forecast_id]`.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = Config::load().context("failed to load configuration")?;
    init_tracing(cfg.telemetry.json);

    let mut request = cfg.default_request();
    request.forecast_id = std::env::args().nth(1);

    info!(
        forecast_id = request.forecast_id.as_deref().unwrap_or(&cfg.forecast.default_id),
        "starting battery dispatch"
    );

    let service = DispatchService::from_config(&cfg);
    match service.optimise(request).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&err.to_response())?);
            Err(err.into())
        }
    }
}

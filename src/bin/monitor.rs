//! RSI Watch Monitor
//!
//! Polls klines on a fixed interval, evaluates RSI and pushes LINE alerts.

use dotenvy::dotenv;
use rsiwatch::config::{get_environment, Config};
use rsiwatch::core::http::start_server;
use rsiwatch::core::runtime::MonitorRuntime;
use rsiwatch::logging;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration, refusing to start");
            std::process::exit(1);
        }
    };

    info!("Starting RSI Watch Monitor");
    info!(environment = %get_environment(), "Environment");
    info!(
        symbol = %config.monitor.symbol,
        interval = %config.monitor.interval,
        period = config.monitor.rsi_period,
        method = %config.monitor.rsi_method,
        poll_secs = config.monitor.poll_interval.as_secs(),
        "Monitoring {} every {}s",
        config.monitor.symbol,
        config.monitor.poll_interval.as_secs()
    );

    let runtime = MonitorRuntime::from_config(&config)?;

    let server_handle = config.health_port.map(|port| {
        let metrics = runtime.metrics.clone();
        let monitor = runtime.monitor.clone();
        tokio::spawn(async move {
            if let Err(e) = start_server(port, metrics, monitor).await {
                error!(error = %e, "Health server error");
            }
        })
    });

    runtime.scheduler.start().await;

    info!("Monitor started, waiting for shutdown signal...");
    signal::ctrl_c().await?;

    info!("Shutting down monitor...");
    runtime.scheduler.stop().await;
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Monitor stopped");

    Ok(())
}

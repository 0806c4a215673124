//! Drowsiness Monitor - Main Entry Point

use alerting::LogAlarm;
use anyhow::Context;
use api::{init_logging, init_metrics, run_server, AppConfig, AppState};
use landmark_source::ReplayProvider;
use session::Monitor;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging);

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let metrics = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Prometheus exporter disabled: {}", e);
            None
        }
    };

    info!(
        "Source at {} fps, onset after {} closed-eye frames",
        config.source.effective_fps(),
        config.dms.required_consecutive_frames
    );

    let provider = ReplayProvider::new(config.source.clone());
    let monitor = Monitor::new(config.dms.clone(), provider, LogAlarm)
        .context("Failed to create monitor")?;
    let (handle, driver) = session::spawn(monitor);

    if config.start_on_boot {
        if let Err(e) = handle.start().await {
            warn!("Monitoring did not start on boot: {}", e);
        }
    }

    let state = Arc::new(AppState::new(handle, metrics));
    run_server(&config.server.bind, state).await?;

    // Router dropped: last handle gone, driver releases resources and exits
    driver.await.context("Monitor driver panicked")?;
    Ok(())
}

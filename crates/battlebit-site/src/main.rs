//! BattleBit community site server binary

use battlebit_contributors::RefreshScheduler;
use battlebit_site::{start_server, AppState, Config, Result, SharedState};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("battlebit_site=info".parse()?)
        .add_directive("battlebit_contributors=info".parse()?)
        .add_directive("battlebit_access_log=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting BattleBit community site...");

    let config = Config::from_env()?;
    info!("Mode: {:?}", config.mode);
    info!("Port: {}", config.port);
    info!(
        "Upstream: {}/{:?}",
        config.github.org, config.github.repos
    );
    info!("Access log dir: {:?}", config.log.dir);

    let state: SharedState = Arc::new(AppState::from_config(&config));

    state.access_log.init().await?;
    let log_tasks = state
        .access_log
        .spawn_background(config.log.flush_interval, config.log.rotate_interval);

    // First refresh runs immediately; the site serves `[]` until it lands
    let scheduler = RefreshScheduler::spawn(
        state.contributors.clone(),
        config.github.refresh_period,
    );

    let served = start_server(state, config.port).await;

    scheduler.shutdown().await;
    log_tasks.shutdown().await;
    info!("Access log flushed, exiting");

    if let Err(e) = served {
        warn!(error = %e, "Server exited with error");
        return Err(e.into());
    }
    Ok(())
}

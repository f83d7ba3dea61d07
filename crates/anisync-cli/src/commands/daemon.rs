use super::{load_config, mapping_store};
use crate::output::Output;
use anisync_config::PathManager;
use anisync_core::MappingStore;
use color_eyre::Result;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

pub async fn run_daemon(no_startup_refresh: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directories: {}", e))?;
    let config = load_config(&paths)?;
    let store = mapping_store(&config, &paths);
    let period = Duration::from_secs(config.mapping.refresh_interval_hours * 3600);

    info!(
        operation = "daemon_started",
        path = %store.path().display(),
        refresh_interval_hours = config.mapping.refresh_interval_hours,
        "Mapping daemon started"
    );
    output.info("Keeping the mapping table fresh. Press Ctrl-C to stop.");

    if no_startup_refresh {
        if let Err(e) = store.load_cached().await {
            warn!(operation = "daemon_startup", error = %e, "No cached mapping table yet");
        }
    } else {
        let table = store.load_or_refresh().await;
        info!(operation = "daemon_startup", rows = table.len(), "Mapping table ready");
    }

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => scheduled_refresh(&store).await,
            _ = tokio::signal::ctrl_c() => {
                info!(operation = "daemon_stopped", "Received Ctrl-C, stopping");
                break;
            }
        }
    }

    Ok(())
}

async fn scheduled_refresh(store: &MappingStore) {
    info!(operation = "scheduled_refresh_start", "Refreshing mapping table");
    match store.refresh().await {
        Ok(rows) => info!(operation = "scheduled_refresh_complete", rows, "Mapping table refreshed"),
        // The previous snapshot stays in place
        Err(e) => error!(operation = "scheduled_refresh_error", error = %e, "Mapping refresh failed"),
    }
}

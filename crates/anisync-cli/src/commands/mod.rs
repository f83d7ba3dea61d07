pub mod config;
pub mod daemon;
pub mod ids;
pub mod mapping;
pub mod resolve;

use crate::output::Output;
use anisync_config::{Config, PathManager};
use anisync_core::{IdBridge, MappingStore};
use anisync_sources::{AnimeListsClient, ArmClient};
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Configuration from the default location, or defaults when none exists yet
pub fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    if !config_file.exists() {
        debug!(path = %config_file.display(), "No configuration file, using defaults");
        return Ok(Config::default());
    }

    let config = Config::load_from_file(&config_file).map_err(|e| {
        color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e)
    })?;
    config.validate().map_err(|e| {
        color_eyre::eyre::eyre!("Invalid configuration in {}: {}", config_file.display(), e)
    })?;
    Ok(config)
}

pub fn mapping_store(config: &Config, paths: &PathManager) -> MappingStore {
    let path = config
        .mapping
        .path
        .clone()
        .unwrap_or_else(|| paths.mapping_file());
    let fetcher = Arc::new(AnimeListsClient::new(config.mapping.url.clone()));
    MappingStore::new(
        path,
        fetcher,
        Duration::from_secs(config.mapping.refresh_interval_hours * 3600),
    )
}

pub fn id_bridge(config: &Config) -> IdBridge {
    IdBridge::new(Arc::new(ArmClient::new(
        config.bridge.base_url.clone(),
        Duration::from_secs(config.bridge.timeout_secs),
    )))
}

/// Spinner for slow network calls; hidden outside the human format
pub fn spinner(output: &Output, message: &'static str) -> ProgressBar {
    if !output.is_human() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

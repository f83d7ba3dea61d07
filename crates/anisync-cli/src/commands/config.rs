use super::load_config;
use crate::output::Output;
use crate::ConfigCommands;
use anisync_config::{Config, PathManager};
use color_eyre::eyre::Context;
use color_eyre::Result;
use std::path::Path;

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    match cmd {
        ConfigCommands::Show => show_config(&paths, output),
        ConfigCommands::Init { force } => {
            let config_file = paths.config_file();
            if write_starter_config(&config_file, force)? {
                output.success(format!("Wrote starter configuration to {}", config_file.display()));
            } else {
                output.warn(format!(
                    "{} already exists, use --force to overwrite it",
                    config_file.display()
                ));
            }
            Ok(())
        }
    }
}

/// Returns false when a file is already there and `force` is off
fn write_starter_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    Config::example()
        .save_to_file(path)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to write {}: {}", path.display(), e))?;
    Ok(true)
}

fn show_config(paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Using defaults. Run 'anisync config init' to create one.");
    }
    let config = load_config(paths)?;

    if !output.is_human() {
        let value = serde_json::to_value(&config).wrap_err("Failed to serialize configuration")?;
        output.json(&value);
        return Ok(());
    }

    output.table(
        "Mapping table",
        &[
            ("URL", config.mapping.url.clone()),
            ("Refresh every (hours)", config.mapping.refresh_interval_hours.to_string()),
            (
                "Cached file",
                config
                    .mapping
                    .path
                    .clone()
                    .unwrap_or_else(|| paths.mapping_file())
                    .display()
                    .to_string(),
            ),
        ],
    );
    output.table(
        "Id bridge",
        &[
            ("Base URL", config.bridge.base_url.clone()),
            ("Timeout (s)", config.bridge.timeout_secs.to_string()),
        ],
    );
    output.table(
        "Sync",
        &[
            ("Concurrent services", config.sync.max_concurrent_services.to_string()),
            ("Run timeout (s)", config.sync.run_timeout_secs.to_string()),
            ("Max sequel hops", config.sync.max_traversal_hops.to_string()),
            ("Search pages", config.search.max_pages.to_string()),
            ("Page delay (ms)", config.search.page_delay_ms.to_string()),
        ],
    );

    for user in &config.users {
        let services: Vec<&str> = user.enabled_services().map(|s| s.as_str()).collect();
        let libraries = if user.library_paths.is_empty() {
            "all".to_string()
        } else {
            user.library_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        output.table(
            &format!("User {}", user.user_id),
            &[
                ("Services", services.join(", ")),
                ("Plan-to-watch only", user.plan_to_watch_only.to_string()),
                ("Track rewatches", user.rewatch_completed.to_string()),
                ("Libraries", libraries),
            ],
        );
    }
    Ok(())
}

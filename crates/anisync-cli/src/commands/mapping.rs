use super::{load_config, mapping_store, spinner};
use crate::output::Output;
use crate::MappingCommands;
use anisync_config::PathManager;
use anisync_core::{DefaultSeason, MappingEntry, MappingStore, MappingTable};
use color_eyre::Result;
use serde_json::json;

pub async fn run_mapping(cmd: MappingCommands, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config = load_config(&paths)?;
    let store = mapping_store(&config, &paths);

    match cmd {
        MappingCommands::Refresh => refresh(&store, output).await,
        MappingCommands::Show { anidb_id } => {
            let table = load(&store).await?;
            show(&table, anidb_id, output);
            Ok(())
        }
        MappingCommands::Stats => {
            let table = load(&store).await?;
            stats(&store, &table, output).await;
            Ok(())
        }
    }
}

async fn refresh(store: &MappingStore, output: &Output) -> Result<()> {
    let progress = spinner(output, "Downloading mapping table...");
    let result = store.refresh().await;
    progress.finish_and_clear();

    let rows = result.map_err(|e| color_eyre::eyre::eyre!("Mapping refresh failed: {}", e))?;
    if output.is_human() {
        output.success(format!("Mapping table updated: {} rows at {}", rows, store.path().display()));
    } else {
        output.json(&json!({ "rows": rows, "path": store.path() }));
    }
    Ok(())
}

async fn load(store: &MappingStore) -> Result<std::sync::Arc<MappingTable>> {
    store.load_cached().await.map_err(|e| {
        color_eyre::eyre::eyre!(
            "No usable mapping table at {} ({}). Run 'anisync mapping refresh' first.",
            store.path().display(),
            e
        )
    })?;
    Ok(store.snapshot())
}

fn default_season_label(entry: &MappingEntry) -> String {
    match entry.default_season {
        Some(DefaultSeason::Season(season)) => season.to_string(),
        Some(DefaultSeason::Absolute) => "absolute".to_string(),
        None => "-".to_string(),
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn show(table: &MappingTable, anidb_id: u32, output: &Output) {
    let rows = table.by_anidb(anidb_id);
    if rows.is_empty() {
        output.warn(format!("AniDB id {} is not in the mapping table", anidb_id));
        return;
    }

    if !output.is_human() {
        let rows: Vec<_> = rows
            .iter()
            .map(|entry| {
                json!({
                    "anidb_id": entry.anidb_id,
                    "tvdb_id": entry.tvdb_id,
                    "tmdb_id": entry.tmdb_id,
                    "default_season": default_season_label(entry),
                    "episode_offset": entry.episode_offset,
                    "name": entry.name,
                    "episode_ranges": entry.episode_ranges.len(),
                })
            })
            .collect();
        output.json(&json!({ "anidb_id": anidb_id, "rows": rows }));
        return;
    }

    for entry in rows {
        output.table(
            entry.name.as_deref().unwrap_or("(unnamed)"),
            &[
                ("AniDB id", entry.anidb_id.to_string()),
                ("TVDB id", optional(entry.tvdb_id)),
                ("TMDB id", optional(entry.tmdb_id)),
                ("Default TVDB season", default_season_label(entry)),
                ("Episode offset", optional(entry.episode_offset)),
                ("Episode ranges", entry.episode_ranges.len().to_string()),
                ("Rows for this TVDB series", table.siblings_of(entry).len().to_string()),
            ],
        );
    }
}

async fn stats(store: &MappingStore, table: &MappingTable, output: &Output) {
    let absolute = table.entries().iter().filter(|e| e.is_absolute()).count();
    let with_tmdb = table.entries().iter().filter(|e| e.tmdb_id.is_some()).count();
    let stale = store.is_stale().await;

    if output.is_human() {
        output.table(
            "Mapping table",
            &[
                ("File", store.path().display().to_string()),
                ("Rows", table.len().to_string()),
                ("TVDB series", table.tvdb_series_count().to_string()),
                ("Absolute-numbered rows", absolute.to_string()),
                ("Rows with TMDB id", with_tmdb.to_string()),
                ("Due for refresh", (if stale { "yes" } else { "no" }).to_string()),
            ],
        );
    } else {
        output.json(&json!({
            "path": store.path(),
            "rows": table.len(),
            "tvdb_series": table.tvdb_series_count(),
            "absolute_rows": absolute,
            "tmdb_rows": with_tmdb,
            "stale": stale,
        }));
    }
}

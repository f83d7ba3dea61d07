use super::{id_bridge, load_config, mapping_store};
use crate::output::Output;
use anisync_config::PathManager;
use anisync_core::{identify, AniDbMatch, IdentityResolver};
use anisync_models::{IdentifierBundle, MediaItem};
use color_eyre::eyre::Context;
use color_eyre::Result;
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};

fn read_item(path: &Path) -> Result<MediaItem> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .wrap_err("Failed to read item from stdin")?;
        raw
    } else {
        std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read item from {}", path.display()))?
    };
    parse_item(&raw)
}

fn parse_item(raw: &str) -> Result<MediaItem> {
    serde_json::from_str(raw).wrap_err("Item is not a valid episode or movie description")
}

pub async fn run_resolve(item_path: PathBuf, bridge: bool, output: &Output) -> Result<()> {
    let item = read_item(&item_path)?;
    let paths = PathManager::default();
    let config = load_config(&paths)?;

    let store = mapping_store(&config, &paths);
    if let Err(e) = store.load_cached().await {
        output.warn(format!(
            "No usable mapping table at {} ({}). Run 'anisync mapping refresh' first.",
            store.path().display(),
            e
        ));
    }
    let table = store.snapshot();

    let matched = IdentityResolver::new(&table).resolve(&item);
    let ids = if bridge {
        Some(identify(&item, &table, &id_bridge(&config)).await.ids)
    } else {
        None
    };

    if output.is_human() {
        output.table("Item", &item_rows(&item));
        match matched {
            Some(m) => output.table("AniDB match", &match_rows(&m, item.episode_index())),
            None => output.warn("No AniDB match in the mapping table"),
        }
        if let Some(ids) = ids {
            output.table("Catalog ids", &bundle_rows(&ids));
        }
    } else {
        output.json(&json!({
            "title": item.title(),
            "kind": item.kind_label(),
            "season": item.season_index(),
            "episode": item.episode_index(),
            "anidb": matched,
            "anidb_episode": matched.map(|m| m.episode_for(item.episode_index())),
            "ids": ids,
        }));
    }

    Ok(())
}

fn item_rows(item: &MediaItem) -> Vec<(&'static str, String)> {
    vec![
        ("Title", item.title().to_string()),
        ("Kind", item.kind_label().to_string()),
        ("Season", item.season_index().to_string()),
        ("Episode", item.episode_index().to_string()),
    ]
}

fn match_rows(m: &AniDbMatch, episode_index: u32) -> Vec<(&'static str, String)> {
    vec![
        ("AniDB id", m.anidb_id.to_string()),
        (
            "Episode offset",
            m.episode_offset.map_or_else(|| "-".to_string(), |o| o.to_string()),
        ),
        ("Episode on AniDB", m.episode_for(episode_index).to_string()),
        ("Matched by", format!("{:?}", m.tier)),
    ]
}

pub(crate) fn bundle_rows(ids: &IdentifierBundle) -> Vec<(&'static str, String)> {
    ids.known()
        .map(|(source, id)| (source.as_str(), id.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anisync_models::ProviderSource;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_episode_item() {
        let raw = r#"{
            "type": "episode",
            "series_name": "Mushoku Tensei",
            "episode_name": null,
            "season_index": 2,
            "episode_index": 3,
            "series_ids": { "tvdb": "371310" },
            "season_ids": {},
            "series_seasons": [
                { "index": 1, "episode_count": 23 },
                { "index": 2, "episode_count": 25 }
            ],
            "path": "/media/anime/Mushoku Tensei/S02E03.mkv"
        }"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(raw.as_bytes()).unwrap();

        let item = read_item(file.path()).unwrap();
        let MediaItem::Episode(episode) = item else {
            panic!("expected an episode");
        };
        assert_eq!(episode.season_index, 2);
        assert_eq!(episode.series_ids.numeric(ProviderSource::Tvdb), Some(371310));
        assert_eq!(episode.local_season_count(), 2);
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert!(parse_item(r#"{ "type": "album", "name": "x" }"#).is_err());
    }
}

use super::{id_bridge, load_config, spinner};
use crate::output::Output;
use anisync_config::PathManager;
use anisync_models::CatalogSource;
use clap::ValueEnum;
use color_eyre::Result;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Anilist,
    Anidb,
    #[value(alias = "mal")]
    Myanimelist,
    Kitsu,
    Simkl,
}

impl From<SourceArg> for CatalogSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Anilist => CatalogSource::AniList,
            SourceArg::Anidb => CatalogSource::AniDb,
            SourceArg::Myanimelist => CatalogSource::MyAnimeList,
            SourceArg::Kitsu => CatalogSource::Kitsu,
            SourceArg::Simkl => CatalogSource::Simkl,
        }
    }
}

pub async fn run_ids(source: SourceArg, id: u64, output: &Output) -> Result<()> {
    let config = load_config(&PathManager::default())?;
    let source = CatalogSource::from(source);

    let progress = spinner(output, "Looking up ids...");
    let ids = id_bridge(&config).lookup(source, id).await;
    progress.finish_and_clear();

    if output.is_human() {
        output.table(&format!("{} {}", source, id), &super::resolve::bundle_rows(&ids));
        if ids.known().count() <= 1 {
            output.warn("The bridge knows no other ids for this anime");
        }
    } else {
        output.json(&json!({ "source": source, "id": id, "ids": ids }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_arg_parsing() {
        assert_eq!(SourceArg::from_str("mal", true), Ok(SourceArg::Myanimelist));
        assert_eq!(
            CatalogSource::from(SourceArg::from_str("anidb", true).unwrap()),
            CatalogSource::AniDb
        );
        assert!(SourceArg::from_str("tvdb", true).is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Metadata providers a library item can carry cross-reference ids for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSource {
    AniList,
    AniDb,
    Tvdb,
    Tmdb,
    MyAnimeList,
    Kitsu,
}

/// Raw provider ids as the media library exposes them (string valued)
///
/// Values are kept verbatim; `numeric` is the only way the core reads them,
/// so malformed values and the informal `0` both read as "absent".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ProviderIds(HashMap<ProviderSource, String>);

impl ProviderIds {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn with(mut self, source: ProviderSource, id: impl Into<String>) -> Self {
        self.insert(source, id);
        self
    }

    pub fn insert(&mut self, source: ProviderSource, id: impl Into<String>) {
        self.0.insert(source, id.into());
    }

    pub fn get(&self, source: ProviderSource) -> Option<&str> {
        self.0.get(&source).map(String::as_str)
    }

    pub fn contains(&self, source: ProviderSource) -> bool {
        self.0.contains_key(&source)
    }

    /// Parse the id for `source` as a positive integer
    pub fn numeric(&self, source: ProviderSource) -> Option<u32> {
        self.get(source)?
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|id| *id != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A season of the series as the local library knows it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalSeason {
    pub index: u32,
    pub episode_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeItem {
    pub series_name: String,
    /// Episode title, used to match specials against side stories
    #[serde(default)]
    pub episode_name: Option<String>,
    pub season_index: u32,
    pub episode_index: u32,
    #[serde(default)]
    pub series_ids: ProviderIds,
    #[serde(default)]
    pub season_ids: ProviderIds,
    /// Every season of the series present in the library (including this one)
    #[serde(default)]
    pub series_seasons: Vec<LocalSeason>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl EpisodeItem {
    /// Number of regular (non-special) seasons known locally
    pub fn local_season_count(&self) -> usize {
        self.series_seasons.iter().filter(|s| s.index >= 1).count()
    }

    /// Episode index counted continuously from season 1
    ///
    /// Only defined when seasons 1..N-1 are all present locally; a gap makes
    /// absolute numbering meaningless and yields `None`.
    pub fn absolute_episode_number(&self) -> Option<u32> {
        let mut earlier: Vec<&LocalSeason> = self
            .series_seasons
            .iter()
            .filter(|s| s.index >= 1 && s.index < self.season_index)
            .collect();
        earlier.sort_by_key(|s| s.index);
        earlier.dedup_by_key(|s| s.index);

        let expected = self.season_index.saturating_sub(1) as usize;
        if earlier.len() != expected {
            return None;
        }
        for (position, season) in earlier.iter().enumerate() {
            if season.index != position as u32 + 1 {
                return None;
            }
        }

        let preceding: u32 = earlier.iter().map(|s| s.episode_count).sum();
        Some(preceding + self.episode_index)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovieItem {
    pub name: String,
    #[serde(default)]
    pub ids: ProviderIds,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Snapshot of a played library item, taken when playback completed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaItem {
    Episode(EpisodeItem),
    Movie(MovieItem),
}

impl MediaItem {
    /// Series name for episodes, movie name for movies
    pub fn title(&self) -> &str {
        match self {
            MediaItem::Episode(episode) => &episode.series_name,
            MediaItem::Movie(movie) => &movie.name,
        }
    }

    /// Movies are treated as season 1
    pub fn season_index(&self) -> u32 {
        match self {
            MediaItem::Episode(episode) => episode.season_index,
            MediaItem::Movie(_) => 1,
        }
    }

    /// Movies are treated as a single episode
    pub fn episode_index(&self) -> u32 {
        match self {
            MediaItem::Episode(episode) => episode.episode_index,
            MediaItem::Movie(_) => 1,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            MediaItem::Episode(episode) => episode.path.as_deref(),
            MediaItem::Movie(movie) => movie.path.as_deref(),
        }
    }

    pub fn is_episode(&self) -> bool {
        matches!(self, MediaItem::Episode(_))
    }

    /// Season 0 holds OVAs and specials
    pub fn is_special(&self) -> bool {
        matches!(self, MediaItem::Episode(episode) if episode.season_index == 0)
    }

    /// Label used in log lines
    pub fn kind_label(&self) -> &'static str {
        match self {
            MediaItem::Episode(_) => "series",
            MediaItem::Movie(_) => "movie",
        }
    }

    /// Ids that identify the whole work (series ids for episodes)
    pub fn work_ids(&self) -> &ProviderIds {
        match self {
            MediaItem::Episode(episode) => &episode.series_ids,
            MediaItem::Movie(movie) => &movie.ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode_with_seasons(season: u32, episode: u32, seasons: &[(u32, u32)]) -> EpisodeItem {
        EpisodeItem {
            series_name: "Test".to_string(),
            episode_name: None,
            season_index: season,
            episode_index: episode,
            series_ids: ProviderIds::new(),
            season_ids: ProviderIds::new(),
            series_seasons: seasons
                .iter()
                .map(|(index, episode_count)| LocalSeason { index: *index, episode_count: *episode_count })
                .collect(),
            path: None,
        }
    }

    #[test]
    fn test_absolute_episode_number_contiguous() {
        let episode = episode_with_seasons(3, 4, &[(1, 12), (2, 13), (3, 12)]);
        assert_eq!(episode.absolute_episode_number(), Some(29));
    }

    #[test]
    fn test_absolute_episode_number_refuses_gap() {
        let episode = episode_with_seasons(4, 2, &[(1, 12), (2, 12), (4, 12)]);
        assert_eq!(episode.absolute_episode_number(), None);
    }

    #[test]
    fn test_absolute_episode_number_ignores_specials() {
        let episode = episode_with_seasons(2, 1, &[(0, 3), (1, 10), (2, 10)]);
        assert_eq!(episode.absolute_episode_number(), Some(11));
    }

    #[test]
    fn test_numeric_treats_zero_as_absent() {
        let ids = ProviderIds::new()
            .with(ProviderSource::AniDb, "0")
            .with(ProviderSource::Tvdb, "81797")
            .with(ProviderSource::AniList, "abc");
        assert_eq!(ids.numeric(ProviderSource::AniDb), None);
        assert_eq!(ids.numeric(ProviderSource::Tvdb), Some(81797));
        assert_eq!(ids.numeric(ProviderSource::AniList), None);
        assert!(ids.contains(ProviderSource::AniDb));
    }

    #[test]
    fn test_media_item_json_shape() {
        let json = r#"{
            "type": "episode",
            "series_name": "Mob Psycho 100",
            "season_index": 2,
            "episode_index": 5,
            "series_ids": { "tvdb": "307250" }
        }"#;
        let item: MediaItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.season_index(), 2);
        assert_eq!(item.work_ids().numeric(ProviderSource::Tvdb), Some(307250));

        let movie: MediaItem = serde_json::from_str(r#"{"type":"movie","name":"Akira"}"#).unwrap();
        assert_eq!(movie.episode_index(), 1);
        assert!(!movie.is_special());
    }
}

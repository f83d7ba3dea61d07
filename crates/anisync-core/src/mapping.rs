//! AniDB↔TVDB mapping table (Anime-Lists `anime-list-full.xml`)

use crate::error::MappingError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::HashMap;

/// `defaulttvdbseason` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultSeason {
    Season(u32),
    /// `a`: the AniDB entry is numbered by absolute episode
    Absolute,
}

/// One `<mapping>` element of a row's mapping list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeRange {
    pub anidb_season: Option<u32>,
    pub tvdb_season: Option<u32>,
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub offset: Option<i32>,
}

impl EpisodeRange {
    /// Inclusive containment; ranges without bounds contain nothing
    pub fn contains(&self, absolute_episode: u32) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= absolute_episode && absolute_episode <= end,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub anidb_id: u32,
    pub tvdb_id: Option<u32>,
    pub tmdb_id: Option<u32>,
    pub default_season: Option<DefaultSeason>,
    pub episode_offset: Option<i32>,
    pub name: Option<String>,
    pub episode_ranges: Vec<EpisodeRange>,
}

impl MappingEntry {
    pub fn new(anidb_id: u32) -> Self {
        Self {
            anidb_id,
            tvdb_id: None,
            tmdb_id: None,
            default_season: None,
            episode_offset: None,
            name: None,
            episode_ranges: Vec::new(),
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.default_season == Some(DefaultSeason::Absolute)
    }

    pub fn is_default_season(&self, season: u32) -> bool {
        self.default_season == Some(DefaultSeason::Season(season))
    }

    /// Row applies to `season`: literal default season or absolute numbering
    pub fn covers_season(&self, season: u32) -> bool {
        self.is_default_season(season) || self.is_absolute()
    }

    pub fn maps_tvdb_season(&self, season: u32) -> bool {
        self.episode_ranges
            .iter()
            .any(|range| range.tvdb_season == Some(season))
    }

    pub fn contains_absolute_episode(&self, absolute_episode: u32) -> bool {
        self.episode_ranges
            .iter()
            .any(|range| range.contains(absolute_episode))
    }
}

/// Read-only mapping dataset, indexed by AniDB, TVDB and TMDB id
///
/// Index vectors keep declaration order.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
    by_anidb: HashMap<u32, Vec<usize>>,
    by_tvdb: HashMap<u32, Vec<usize>>,
    by_tmdb: HashMap<u32, Vec<usize>>,
}

impl MappingTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<MappingEntry>) -> Self {
        let mut by_anidb: HashMap<u32, Vec<usize>> = HashMap::new();
        let mut by_tvdb: HashMap<u32, Vec<usize>> = HashMap::new();
        let mut by_tmdb: HashMap<u32, Vec<usize>> = HashMap::new();

        for (index, entry) in entries.iter().enumerate() {
            by_anidb.entry(entry.anidb_id).or_default().push(index);
            if let Some(tvdb) = entry.tvdb_id {
                by_tvdb.entry(tvdb).or_default().push(index);
            }
            if let Some(tmdb) = entry.tmdb_id {
                by_tmdb.entry(tmdb).or_default().push(index);
            }
        }

        Self {
            entries,
            by_anidb,
            by_tvdb,
            by_tmdb,
        }
    }

    pub fn parse(xml: &[u8]) -> Result<Self, MappingError> {
        parse_anime_list(xml).map(Self::from_entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn by_anidb(&self, anidb_id: u32) -> Vec<&MappingEntry> {
        self.collect(self.by_anidb.get(&anidb_id))
    }

    pub fn by_tvdb(&self, tvdb_id: u32) -> Vec<&MappingEntry> {
        self.collect(self.by_tvdb.get(&tvdb_id))
    }

    pub fn by_tmdb(&self, tmdb_id: u32) -> Vec<&MappingEntry> {
        self.collect(self.by_tmdb.get(&tmdb_id))
    }

    pub fn first_by_anidb(&self, anidb_id: u32) -> Option<&MappingEntry> {
        self.by_anidb
            .get(&anidb_id)
            .and_then(|indices| indices.first())
            .map(|index| &self.entries[*index])
    }

    /// Rows sharing a TVDB id with `entry` (including itself)
    pub fn siblings_of<'a>(&'a self, entry: &'a MappingEntry) -> Vec<&'a MappingEntry> {
        match entry.tvdb_id {
            Some(tvdb) => self.by_tvdb(tvdb),
            None => vec![entry],
        }
    }

    pub fn tvdb_series_count(&self) -> usize {
        self.by_tvdb.len()
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<&MappingEntry> {
        indices
            .map(|indices| indices.iter().map(|i| &self.entries[*i]).collect())
            .unwrap_or_default()
    }
}

fn parse_positive(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|n| *n != 0)
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

fn parse_i32(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok()
}

#[derive(Default)]
struct AnimeBuilder {
    anidb_id: Option<u32>,
    tvdb_id: Option<u32>,
    tmdb_id: Option<u32>,
    default_season: Option<DefaultSeason>,
    episode_offset: Option<i32>,
    name: Option<String>,
    episode_ranges: Vec<EpisodeRange>,
}

impl AnimeBuilder {
    fn from_element(element: &BytesStart<'_>) -> Self {
        let mut builder = Self::default();
        for attr in element.attributes().flatten() {
            let value = String::from_utf8_lossy(&attr.value);
            match attr.key.as_ref() {
                b"anidbid" => builder.anidb_id = parse_positive(&value),
                // "movie", "hentai", "unknown" and friends are not ids
                b"tvdbid" => builder.tvdb_id = parse_positive(&value),
                b"tmdbid" => builder.tmdb_id = parse_positive(&value),
                b"defaulttvdbseason" => {
                    builder.default_season = if value.trim() == "a" {
                        Some(DefaultSeason::Absolute)
                    } else {
                        parse_u32(&value).map(DefaultSeason::Season)
                    }
                }
                b"episodeoffset" => builder.episode_offset = parse_i32(&value),
                _ => {}
            }
        }
        builder
    }

    fn build(self) -> Option<MappingEntry> {
        Some(MappingEntry {
            anidb_id: self.anidb_id?,
            tvdb_id: self.tvdb_id,
            tmdb_id: self.tmdb_id,
            default_season: self.default_season,
            episode_offset: self.episode_offset,
            name: self.name,
            episode_ranges: self.episode_ranges,
        })
    }
}

fn episode_range(element: &BytesStart<'_>) -> EpisodeRange {
    let mut range = EpisodeRange::default();
    for attr in element.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"anidbseason" => range.anidb_season = parse_u32(&value),
            b"tvdbseason" => range.tvdb_season = parse_u32(&value),
            b"start" => range.start = parse_u32(&value),
            b"end" => range.end = parse_u32(&value),
            b"offset" => range.offset = parse_i32(&value),
            _ => {}
        }
    }
    range
}

/// Parse `anime-list-full.xml` into rows, dropping rows without a usable AniDB id
pub fn parse_anime_list(xml: &[u8]) -> Result<Vec<MappingEntry>, MappingError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<AnimeBuilder> = None;
    let mut in_name = false;
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"anime-list" => saw_root = true,
                b"anime" => current = Some(AnimeBuilder::from_element(&e)),
                b"name" => in_name = current.is_some(),
                b"mapping" => {
                    if let Some(ref mut anime) = current {
                        anime.episode_ranges.push(episode_range(&e));
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"anime-list" => saw_root = true,
                b"anime" => {
                    if let Some(entry) = AnimeBuilder::from_element(&e).build() {
                        entries.push(entry);
                    }
                }
                b"mapping" => {
                    if let Some(ref mut anime) = current {
                        anime.episode_ranges.push(episode_range(&e));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_name {
                    if let Some(ref mut anime) = current {
                        let text = e.unescape().unwrap_or_default().to_string();
                        if !text.is_empty() {
                            anime.name = Some(text);
                        }
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"anime" => {
                    if let Some(entry) = current.take().and_then(AnimeBuilder::build) {
                        entries.push(entry);
                    }
                }
                b"name" => in_name = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MappingError::Xml(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(MappingError::Xml("missing <anime-list> root".to_string()));
    }

    Ok(entries)
}

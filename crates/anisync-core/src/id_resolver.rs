//! Maps a library item onto an AniDB id (and episode offset) using the
//! AniDB↔TVDB mapping table.

use crate::mapping::{MappingEntry, MappingTable};
use anisync_models::{EpisodeItem, MediaItem, ProviderSource};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Which lookup produced the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    DirectId,
    AniDbMapping,
    AbsoluteEpisode,
    SeasonOffset,
    TvdbMapping,
    TmdbMapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AniDbMatch {
    pub anidb_id: u32,
    /// Episodes to subtract from the local episode index
    pub episode_offset: Option<i32>,
    pub tier: ResolutionTier,
}

impl AniDbMatch {
    fn new(anidb_id: u32, episode_offset: Option<i32>, tier: ResolutionTier) -> Self {
        Self {
            anidb_id,
            episode_offset,
            tier,
        }
    }

    /// Local episode index translated into the matched entry's numbering
    ///
    /// Falls back to the untranslated index when the offset would push it
    /// below 1.
    pub fn episode_for(&self, episode_index: u32) -> u32 {
        match self.episode_offset {
            Some(offset) => {
                let shifted = i64::from(episode_index) - i64::from(offset);
                if shifted >= 1 {
                    shifted as u32
                } else {
                    episode_index
                }
            }
            None => episode_index,
        }
    }
}

/// Resolves items against one mapping-table snapshot
pub struct IdentityResolver<'a> {
    table: &'a MappingTable,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(table: &'a MappingTable) -> Self {
        Self { table }
    }

    /// First matching tier wins; `None` means fall back to title search
    pub fn resolve(&self, item: &MediaItem) -> Option<AniDbMatch> {
        if self.table.is_empty() {
            debug!("Mapping table is empty, skipping id resolution");
            return None;
        }

        let season = item.season_index();
        let episode = item.episode_index();

        if let Some(found) = self.direct_id(item, season) {
            return Some(found);
        }
        if let Some(found) = self.by_anidb_id(item, season, episode) {
            return Some(found);
        }
        if let Some(found) = self.by_tvdb_id(item, season, episode) {
            return Some(found);
        }
        if let Some(found) = self.by_tmdb_id(item) {
            return Some(found);
        }

        debug!(title = item.title(), season, episode, "No mapping row matched");
        None
    }

    /// AniDB id attached to the season (or movie) itself
    fn direct_id(&self, item: &MediaItem, season: u32) -> Option<AniDbMatch> {
        let (anidb_id, confirmed) = match item {
            MediaItem::Movie(movie) => (movie.ids.numeric(ProviderSource::AniDb)?, true),
            MediaItem::Episode(episode) => {
                let anidb_id = episode.season_ids.numeric(ProviderSource::AniDb)?;
                let confirmed = season == 1
                    || self
                        .table
                        .by_anidb(anidb_id)
                        .iter()
                        .any(|row| row.is_default_season(season));
                (anidb_id, confirmed)
            }
        };

        if !confirmed {
            debug!(
                anidb_id,
                season, "Season-level AniDB id not confirmed by mapping table"
            );
            return None;
        }

        info!(title = item.title(), anidb_id, "Item already carries an AniDB id");
        Some(AniDbMatch::new(anidb_id, None, ResolutionTier::DirectId))
    }

    fn by_anidb_id(&self, item: &MediaItem, season: u32, episode: u32) -> Option<AniDbMatch> {
        let (anidb_id, season_level) = match item {
            MediaItem::Episode(ep) => match ep.season_ids.numeric(ProviderSource::AniDb) {
                Some(id) => (id, true),
                None => (ep.series_ids.numeric(ProviderSource::AniDb)?, false),
            },
            MediaItem::Movie(movie) => (movie.ids.numeric(ProviderSource::AniDb)?, false),
        };

        let rows: Vec<&MappingEntry> = self
            .table
            .by_anidb(anidb_id)
            .into_iter()
            .filter(|row| season_level || row.covers_season(season))
            .collect();

        let row = match rows.as_slice() {
            [] => {
                warn!(anidb_id, season, "AniDB id not found in mapping table");
                return None;
            }
            [row] => *row,
            _ => {
                warn!(
                    anidb_id,
                    matches = rows.len(),
                    "More than one mapping row for AniDB id, mapping data is ambiguous"
                );
                return None;
            }
        };

        let siblings = self.table.siblings_of(row);
        match item {
            MediaItem::Episode(ep) if ep.local_season_count() > 1 && siblings.len() > 1 => {
                by_absolute_episode(ep, &siblings)
            }
            MediaItem::Episode(_) if season > 1 => season_lookup(&siblings, season, episode),
            _ => {
                info!(title = item.title(), anidb_id = row.anidb_id, "Found in mapping table");
                Some(AniDbMatch::new(row.anidb_id, None, ResolutionTier::AniDbMapping))
            }
        }
    }

    fn by_tvdb_id(&self, item: &MediaItem, season: u32, episode: u32) -> Option<AniDbMatch> {
        let tvdb_id = item.work_ids().numeric(ProviderSource::Tvdb)?;
        let rows = self.table.by_tvdb(tvdb_id);

        let first = match rows.as_slice() {
            [] => {
                warn!(tvdb_id, "TVDB id not found in mapping table");
                return None;
            }
            [only] => {
                info!(title = item.title(), tvdb_id, anidb_id = only.anidb_id, "Found by TVDB id");
                return Some(AniDbMatch::new(
                    only.anidb_id,
                    only.episode_offset,
                    ResolutionTier::TvdbMapping,
                ));
            }
            [first, ..] => *first,
        };

        match item {
            MediaItem::Episode(ep) if ep.local_season_count() > 1 => by_absolute_episode(ep, &rows),
            MediaItem::Episode(_) if season > 1 => season_lookup(&rows, season, episode),
            _ => season_lookup(&rows, season, episode).or_else(|| {
                Some(AniDbMatch::new(
                    first.anidb_id,
                    first.episode_offset,
                    ResolutionTier::TvdbMapping,
                ))
            }),
        }
    }

    fn by_tmdb_id(&self, item: &MediaItem) -> Option<AniDbMatch> {
        let MediaItem::Movie(movie) = item else {
            return None;
        };
        let tmdb_id = movie.ids.numeric(ProviderSource::Tmdb)?;
        match self.table.by_tmdb(tmdb_id).as_slice() {
            [only] => {
                info!(title = %movie.name, tmdb_id, anidb_id = only.anidb_id, "Found by TMDB id");
                Some(AniDbMatch::new(only.anidb_id, None, ResolutionTier::TmdbMapping))
            }
            [] => None,
            rows => {
                warn!(tmdb_id, matches = rows.len(), "TMDB id maps to several AniDB entries");
                None
            }
        }
    }
}

/// Match the absolute episode number against the siblings' episode ranges,
/// falling back to the season-offset lookup
fn by_absolute_episode(episode: &EpisodeItem, siblings: &[&MappingEntry]) -> Option<AniDbMatch> {
    match episode.absolute_episode_number() {
        Some(absolute) => {
            let containing: Vec<&&MappingEntry> = siblings
                .iter()
                .filter(|row| row.contains_absolute_episode(absolute))
                .collect();
            if let [row] = containing.as_slice() {
                info!(
                    series = %episode.series_name,
                    absolute,
                    anidb_id = row.anidb_id,
                    "Matched by absolute episode number"
                );
                return Some(AniDbMatch::new(row.anidb_id, None, ResolutionTier::AbsoluteEpisode));
            }
            debug!(absolute, matches = containing.len(), "No single range holds absolute episode");
        }
        None => debug!(
            series = %episode.series_name,
            "Earlier seasons incomplete, absolute episode number undefined"
        ),
    }

    season_lookup(siblings, episode.season_index, episode.episode_index)
}

/// Pick the sibling covering `season`/`episode`
///
/// Absolute-numbered rows with an explicit mapping for the season win.
/// Otherwise the row for that season with the largest offset still below
/// the episode number; on equal offsets the later row.
fn season_lookup(siblings: &[&MappingEntry], season: u32, episode: u32) -> Option<AniDbMatch> {
    if let Some(row) = siblings
        .iter()
        .find(|row| row.is_absolute() && row.maps_tvdb_season(season))
    {
        return Some(AniDbMatch::new(row.anidb_id, None, ResolutionTier::SeasonOffset));
    }

    let episode = i64::from(episode);
    let found = siblings
        .iter()
        .filter(|row| row.is_default_season(season))
        .filter(|row| row.episode_offset.map_or(true, |offset| i64::from(offset) < episode))
        // max_by_key keeps the last of equal keys
        .max_by_key(|row| row.episode_offset.unwrap_or(0))?;

    debug!(
        season,
        anidb_id = found.anidb_id,
        offset = ?found.episode_offset,
        "Matched by season offset"
    );
    Some(AniDbMatch::new(
        found.anidb_id,
        found.episode_offset,
        ResolutionTier::SeasonOffset,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{DefaultSeason, EpisodeRange};
    use anisync_models::{LocalSeason, MovieItem, ProviderIds};

    fn row(anidb: u32, tvdb: u32, season: u32, offset: Option<i32>) -> MappingEntry {
        let mut entry = MappingEntry::new(anidb);
        entry.tvdb_id = Some(tvdb);
        entry.default_season = Some(DefaultSeason::Season(season));
        entry.episode_offset = offset;
        entry
    }

    fn ranged(mut entry: MappingEntry, tvdb_season: u32, start: u32, end: u32) -> MappingEntry {
        entry.episode_ranges.push(EpisodeRange {
            anidb_season: Some(1),
            tvdb_season: Some(tvdb_season),
            start: Some(start),
            end: Some(end),
            offset: None,
        });
        entry
    }

    fn episode(season: u32, episode: u32, seasons: &[(u32, u32)]) -> EpisodeItem {
        EpisodeItem {
            series_name: "Test Series".to_string(),
            episode_name: None,
            season_index: season,
            episode_index: episode,
            series_ids: ProviderIds::new(),
            season_ids: ProviderIds::new(),
            series_seasons: seasons
                .iter()
                .map(|(index, episode_count)| LocalSeason {
                    index: *index,
                    episode_count: *episode_count,
                })
                .collect(),
            path: None,
        }
    }

    #[test]
    fn test_season_one_direct_id() {
        let table = MappingTable::from_entries(vec![row(1, 10, 1, None)]);
        let mut ep = episode(1, 3, &[(1, 12)]);
        ep.season_ids.insert(ProviderSource::AniDb, "777");

        let found = IdentityResolver::new(&table)
            .resolve(&MediaItem::Episode(ep))
            .unwrap();
        assert_eq!(found, AniDbMatch::new(777, None, ResolutionTier::DirectId));
    }

    #[test]
    fn test_direct_id_requires_season_confirmation() {
        let table = MappingTable::from_entries(vec![row(5, 50, 2, None), row(6, 60, 1, None)]);

        let mut confirmed = episode(2, 4, &[(2, 12)]);
        confirmed.season_ids.insert(ProviderSource::AniDb, "5");
        let found = IdentityResolver::new(&table)
            .resolve(&MediaItem::Episode(confirmed))
            .unwrap();
        assert_eq!(found.tier, ResolutionTier::DirectId);

        // Row 6 says season 1, item says season 2: no season-2 row exists for it
        let mut mismatched = episode(2, 4, &[(2, 12)]);
        mismatched.season_ids.insert(ProviderSource::AniDb, "6");
        assert_eq!(
            IdentityResolver::new(&table).resolve(&MediaItem::Episode(mismatched)),
            None
        );
    }

    #[test]
    fn test_offset_selection_picks_largest_below_episode() {
        let table = MappingTable::from_entries(vec![
            row(1, 100, 1, Some(0)),
            row(2, 100, 1, Some(12)),
            row(3, 100, 1, Some(24)),
        ]);
        let mut ep = episode(1, 15, &[(1, 36)]);
        ep.series_ids.insert(ProviderSource::Tvdb, "100");

        let found = IdentityResolver::new(&table)
            .resolve(&MediaItem::Episode(ep))
            .unwrap();
        assert_eq!(found.anidb_id, 2);
        assert_eq!(found.episode_offset, Some(12));
        assert_eq!(found.episode_for(15), 3);
    }

    #[test]
    fn test_offset_equal_to_episode_is_excluded() {
        let table = MappingTable::from_entries(vec![row(1, 100, 1, None), row(2, 100, 1, Some(12))]);
        let mut ep = episode(1, 12, &[(1, 24)]);
        ep.series_ids.insert(ProviderSource::Tvdb, "100");

        let found = IdentityResolver::new(&table)
            .resolve(&MediaItem::Episode(ep))
            .unwrap();
        assert_eq!(found.anidb_id, 1);
        assert_eq!(found.episode_offset, None);
    }

    #[test]
    fn test_equal_offsets_prefer_later_row() {
        let table = MappingTable::from_entries(vec![row(1, 100, 2, Some(0)), row(2, 100, 2, None)]);
        let mut ep = episode(2, 5, &[(2, 12)]);
        ep.series_ids.insert(ProviderSource::Tvdb, "100");

        let found = IdentityResolver::new(&table)
            .resolve(&MediaItem::Episode(ep))
            .unwrap();
        assert_eq!(found.anidb_id, 2);
    }

    #[test]
    fn test_absolute_episode_match() {
        let table = MappingTable::from_entries(vec![
            ranged(row(100, 500, 1, None), 1, 1, 12),
            ranged(row(101, 500, 2, None), 1, 13, 24),
        ]);
        let mut ep = episode(2, 3, &[(1, 12), (2, 12)]);
        ep.series_ids.insert(ProviderSource::AniDb, "100");
        ep.series_ids.insert(ProviderSource::Tvdb, "500");

        let found = IdentityResolver::new(&table)
            .resolve(&MediaItem::Episode(ep))
            .unwrap();
        assert_eq!(found, AniDbMatch::new(101, None, ResolutionTier::AbsoluteEpisode));
    }

    #[test]
    fn test_gap_in_seasons_refuses_absolute_numbering() {
        let table = MappingTable::from_entries(vec![
            ranged(row(100, 500, 1, None), 1, 1, 12),
            ranged(row(101, 500, 2, None), 1, 13, 24),
            ranged(row(102, 500, 3, None), 1, 25, 36),
        ]);
        let mut ep = episode(4, 1, &[(1, 12), (2, 12), (4, 12)]);
        ep.series_ids.insert(ProviderSource::Tvdb, "500");

        assert!(IdentityResolver::new(&table)
            .resolve(&MediaItem::Episode(ep))
            .is_none());
    }

    #[test]
    fn test_absolute_default_season_with_explicit_mapping() {
        let mut absolute = MappingEntry::new(200);
        absolute.tvdb_id = Some(600);
        absolute.default_season = Some(DefaultSeason::Absolute);
        let absolute = ranged(absolute, 3, 1, 50);
        let table = MappingTable::from_entries(vec![row(199, 600, 1, None), absolute]);

        let mut ep = episode(3, 2, &[(3, 13)]);
        ep.series_ids.insert(ProviderSource::Tvdb, "600");
        let found = IdentityResolver::new(&table)
            .resolve(&MediaItem::Episode(ep))
            .unwrap();
        assert_eq!(found, AniDbMatch::new(200, None, ResolutionTier::SeasonOffset));
    }

    #[test]
    fn test_ambiguous_anidb_rows_fall_through() {
        let mut a = MappingEntry::new(9);
        a.default_season = Some(DefaultSeason::Season(1));
        let b = a.clone();
        let table = MappingTable::from_entries(vec![a, b]);

        let mut ep = episode(1, 1, &[(1, 12)]);
        ep.series_ids.insert(ProviderSource::AniDb, "9");
        assert!(IdentityResolver::new(&table)
            .resolve(&MediaItem::Episode(ep))
            .is_none());
    }

    #[test]
    fn test_single_tvdb_row_keeps_its_offset() {
        let table = MappingTable::from_entries(vec![row(42, 4242, 1, Some(13))]);
        let mut ep = episode(1, 20, &[(1, 26)]);
        ep.series_ids.insert(ProviderSource::Tvdb, "4242");

        let found = IdentityResolver::new(&table)
            .resolve(&MediaItem::Episode(ep))
            .unwrap();
        assert_eq!(found, AniDbMatch::new(42, Some(13), ResolutionTier::TvdbMapping));
        assert_eq!(found.episode_for(20), 7);
        assert_eq!(found.episode_for(5), 5);
    }

    #[test]
    fn test_later_season_without_tvdb_row_fails_tier() {
        let table = MappingTable::from_entries(vec![row(1, 100, 1, None), row(2, 100, 1, Some(12))]);
        let mut ep = episode(2, 3, &[(2, 12)]);
        ep.series_ids.insert(ProviderSource::Tvdb, "100");

        assert_eq!(IdentityResolver::new(&table).resolve(&MediaItem::Episode(ep)), None);
    }

    #[test]
    fn test_first_season_without_offset_match_uses_first_row() {
        let table = MappingTable::from_entries(vec![row(1, 100, 2, None), row(2, 100, 3, None)]);
        let mut ep = episode(1, 3, &[(1, 12)]);
        ep.series_ids.insert(ProviderSource::Tvdb, "100");

        let found = IdentityResolver::new(&table)
            .resolve(&MediaItem::Episode(ep))
            .unwrap();
        assert_eq!(found, AniDbMatch::new(1, None, ResolutionTier::TvdbMapping));
    }

    #[test]
    fn test_movie_by_tmdb() {
        let mut film = MappingEntry::new(5391);
        film.tmdb_id = Some(16859);
        let table = MappingTable::from_entries(vec![film]);

        let movie = MediaItem::Movie(MovieItem {
            name: "Evangelion 1.0".to_string(),
            ids: ProviderIds::new().with(ProviderSource::Tmdb, "16859"),
            path: None,
        });
        let found = IdentityResolver::new(&table).resolve(&movie).unwrap();
        assert_eq!(found, AniDbMatch::new(5391, None, ResolutionTier::TmdbMapping));
    }

    #[test]
    fn test_zero_ids_are_absent() {
        let table = MappingTable::from_entries(vec![row(1, 10, 1, None)]);
        let mut ep = episode(1, 1, &[(1, 12)]);
        ep.season_ids.insert(ProviderSource::AniDb, "0");
        ep.series_ids.insert(ProviderSource::Tvdb, "0");

        assert!(IdentityResolver::new(&table)
            .resolve(&MediaItem::Episode(ep))
            .is_none());
    }

    #[test]
    fn test_deterministic() {
        let table = MappingTable::from_entries(vec![
            row(1, 100, 1, Some(0)),
            row(2, 100, 1, Some(12)),
            row(3, 100, 1, Some(24)),
        ]);
        let mut ep = episode(1, 30, &[(1, 36)]);
        ep.series_ids.insert(ProviderSource::Tvdb, "100");
        let item = MediaItem::Episode(ep);

        let resolver = IdentityResolver::new(&table);
        let first = resolver.resolve(&item);
        for _ in 0..5 {
            assert_eq!(resolver.resolve(&item), first);
        }
        assert_eq!(first.unwrap().anidb_id, 3);
    }
}

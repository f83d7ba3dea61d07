//! Cross-catalog id bridge and the per-item identification step

use crate::id_resolver::{AniDbMatch, IdentityResolver};
use crate::mapping::MappingTable;
use anisync_models::{CatalogSource, IdentifierBundle, MediaItem, ProviderSource};
use anisync_sources::IdAggregator;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Wraps the aggregator so callers always get a bundle back
#[derive(Clone, Default)]
pub struct IdBridge {
    aggregator: Option<Arc<dyn IdAggregator>>,
}

impl IdBridge {
    pub fn new(aggregator: Arc<dyn IdAggregator>) -> Self {
        Self {
            aggregator: Some(aggregator),
        }
    }

    /// Bridge that never calls out; every lookup returns the known id only
    pub fn offline() -> Self {
        Self { aggregator: None }
    }

    /// Equivalent ids in other catalogs. One call, no retries; any failure
    /// yields a bundle holding just `(source, id)`.
    pub async fn lookup(&self, source: CatalogSource, id: u64) -> IdentifierBundle {
        let known = IdentifierBundle::only(source, id);
        let Some(aggregator) = &self.aggregator else {
            return known;
        };

        match aggregator.lookup(source, id).await {
            Ok(Some(mut bundle)) if !bundle.is_empty() => {
                bundle.merge(&known);
                debug!(%source, id, ids = %bundle, "Aggregator returned ids");
                bundle
            }
            Ok(_) => {
                debug!(%source, id, "Aggregator has no ids for this entry");
                known
            }
            Err(e) => {
                warn!(%source, id, error = %e, "Id aggregator lookup failed");
                known
            }
        }
    }
}

/// Result of identifying an item once per sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identification {
    pub ids: IdentifierBundle,
    /// Mapping-table match, when the table was consulted and matched
    pub anidb: Option<AniDbMatch>,
}

impl Identification {
    pub fn episode_offset(&self) -> Option<i32> {
        self.anidb.and_then(|m| m.episode_offset)
    }

    /// Local episode index shifted into the resolved entry's numbering
    pub fn episode_for(&self, episode_index: u32) -> u32 {
        match self.anidb {
            Some(found) => found.episode_for(episode_index),
            None => episode_index,
        }
    }
}

/// Compute the identifier bundle for an item
///
/// An AniList id on a season-1 episode or a movie is trusted as is; anything
/// else goes through the mapping table first and is bridged from AniDB.
pub async fn identify(item: &MediaItem, table: &MappingTable, bridge: &IdBridge) -> Identification {
    let anilist_id = item
        .work_ids()
        .numeric(ProviderSource::AniList)
        .filter(|_| !item.is_episode() || item.season_index() == 1);

    if let Some(anilist_id) = anilist_id {
        debug!(title = item.title(), anilist_id, "Using item's own AniList id");
        return Identification {
            ids: bridge.lookup(CatalogSource::AniList, u64::from(anilist_id)).await,
            anidb: None,
        };
    }

    match IdentityResolver::new(table).resolve(item) {
        Some(found) => Identification {
            ids: bridge.lookup(CatalogSource::AniDb, u64::from(found.anidb_id)).await,
            anidb: Some(found),
        },
        None => Identification::default(),
    }
}

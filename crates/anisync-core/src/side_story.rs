use crate::error::SyncError;
use crate::matching::contains_ignoring_symbols;
use anisync_models::{CatalogEntry, RelationKind};
use anisync_sources::TrackingService;
use tracing::{debug, info, warn};

/// Match a special/OVA episode against the side stories of `root_id`
///
/// Each side-story, alternative-version and alternative-setting relation is
/// fetched in order; the first whose title, English title or Japanese title
/// contains `episode_name` wins. `Ok(None)` when nothing matches.
pub async fn find_ova(
    service: &dyn TrackingService,
    root_id: u64,
    episode_name: &str,
) -> Result<Option<CatalogEntry>, SyncError> {
    let name = service.service_name();
    let root = match service.get_anime(root_id, true).await {
        Ok(Some(root)) => root,
        Ok(None) => return Ok(None),
        Err(e) => return Err(SyncError::external(name, e)),
    };

    for related_id in root.related(&RelationKind::SIDE_STORY_LIKE) {
        let candidate = match service.get_anime(related_id, false).await {
            Ok(Some(candidate)) => candidate,
            Ok(None) => continue,
            Err(e) => {
                warn!(service = name, related_id, error = %e, "Skipping side story that failed to load");
                continue;
            }
        };

        let titles = [
            Some(candidate.title.as_str()),
            candidate.alternative_titles.english.as_deref(),
            candidate.alternative_titles.japanese.as_deref(),
        ];
        if titles
            .into_iter()
            .flatten()
            .any(|title| contains_ignoring_symbols(title, episode_name))
        {
            info!(service = name, title = candidate.display_title(), "Matched OVA");
            return Ok(Some(candidate));
        }
        debug!(service = name, related_id, "Side story title does not match");
    }

    Ok(None)
}

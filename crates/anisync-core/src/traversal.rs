//! Walking a service's sequel graph to find later seasons and cours

use crate::error::SyncError;
use anisync_models::CatalogEntry;
use anisync_sources::TrackingService;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Where a cour walk stopped
#[derive(Debug)]
pub enum CourEnd {
    /// The season holding the requested episode, and the episode number
    /// within that season
    Found { entry: CatalogEntry, episode: u32 },
    /// Nothing follows a currently airing root with an unknown length; the
    /// root stays the target with the episode number unchanged
    AiringRoot { entry: CatalogEntry },
    DeadEnd(SyncError),
}

/// Outcome of [`SeasonTraversal::walk_cours`]
#[derive(Debug)]
pub struct CourWalk {
    /// Seasons passed over entirely, in order; the caller marks them complete
    pub consumed: Vec<CatalogEntry>,
    pub end: CourEnd,
}

/// Sequel traversal over one tracking service, bounded by `max_hops`
pub struct SeasonTraversal<'a> {
    service: &'a dyn TrackingService,
    max_hops: u32,
}

impl<'a> SeasonTraversal<'a> {
    pub fn new(service: &'a dyn TrackingService, max_hops: u32) -> Self {
        Self { service, max_hops }
    }

    async fn fetch(&self, id: u64) -> Result<CatalogEntry, SyncError> {
        match self.service.get_anime(id, true).await {
            Ok(Some(entry)) => Ok(entry),
            Ok(None) => Err(SyncError::TraversalDeadEnd(format!(
                "{} has no entry {}",
                self.service.service_name(),
                id
            ))),
            Err(e) => Err(SyncError::external(self.service.service_name(), e)),
        }
    }

    /// Follow the first Sequel relation `target_season - 1` times from the
    /// season-1 entry `root_id`
    pub async fn find_season(&self, root_id: u64, target_season: u32) -> Result<CatalogEntry, SyncError> {
        let service = self.service.service_name();
        let hops = target_season.saturating_sub(1);
        if hops > self.max_hops {
            return Err(SyncError::TraversalDeadEnd(format!(
                "season {} is beyond the {} hop limit",
                target_season, self.max_hops
            )));
        }

        debug!(service, root_id, "Fetching season 1");
        let mut current = self.fetch(root_id).await?;
        let mut visited = HashSet::from([current.id]);

        for season in 2..=target_season {
            let Some(next_id) = current.first_sequel() else {
                info!(service, title = current.display_title(), season, "No sequel found");
                return Err(SyncError::TraversalDeadEnd(format!(
                    "{} has no sequel for season {}",
                    current.display_title(),
                    season
                )));
            };
            if !visited.insert(next_id) {
                warn!(service, next_id, "Sequel chain loops back on itself");
                return Err(SyncError::TraversalDeadEnd(format!(
                    "sequel chain revisits {}",
                    next_id
                )));
            }

            debug!(service, season, next_id, "Fetching season");
            current = self.fetch(next_id).await?;
        }

        Ok(current)
    }

    /// Find the season holding absolute episode `episode` when it runs past
    /// `root`'s length (split cours, or seasons merged locally)
    pub async fn walk_cours(&self, root: &CatalogEntry, episode: u32) -> CourWalk {
        let service = self.service.service_name();
        let mut consumed = Vec::new();

        let mut current = match self.fetch(root.id).await {
            Ok(entry) => entry,
            Err(e) => {
                return CourWalk {
                    consumed,
                    end: CourEnd::DeadEnd(e),
                }
            }
        };
        let root_id = current.id;
        let mut visited = HashSet::from([root_id]);
        let mut reached = current.total_episodes;
        let mut before = 0u32;
        let mut hops = 0u32;

        while reached < episode {
            let Some(next_id) = current.first_sequel() else {
                if current.id == root_id && current.is_airing() && current.total_episodes == 0 {
                    info!(
                        service,
                        title = current.display_title(),
                        "Airing with no episode count, using first season"
                    );
                    return CourWalk {
                        consumed,
                        end: CourEnd::AiringRoot { entry: current },
                    };
                }
                warn!(service, title = current.display_title(), episode, "Ran out of seasons");
                return CourWalk {
                    consumed,
                    end: CourEnd::DeadEnd(SyncError::TraversalDeadEnd(format!(
                        "no season after {} holds episode {}",
                        current.display_title(),
                        episode
                    ))),
                };
            };

            hops += 1;
            if hops > self.max_hops {
                return CourWalk {
                    consumed,
                    end: CourEnd::DeadEnd(SyncError::TraversalDeadEnd(format!(
                        "episode {} is beyond the {} hop limit",
                        episode, self.max_hops
                    ))),
                };
            }
            if !visited.insert(next_id) {
                warn!(service, next_id, "Sequel chain loops back on itself");
                return CourWalk {
                    consumed,
                    end: CourEnd::DeadEnd(SyncError::TraversalDeadEnd(format!(
                        "sequel chain revisits {}",
                        next_id
                    ))),
                };
            }

            let next = match self.fetch(next_id).await {
                Ok(entry) => entry,
                Err(e) => {
                    return CourWalk {
                        consumed,
                        end: CourEnd::DeadEnd(e),
                    }
                }
            };

            before += current.total_episodes;
            reached += next.total_episodes;
            debug!(
                service,
                from = current.id,
                to = next.id,
                reached,
                "Moving past fully watched season"
            );
            consumed.push(std::mem::replace(&mut current, next));

            // Length not known yet: it has to be this one
            if current.total_episodes == 0 {
                break;
            }
        }

        CourWalk {
            consumed,
            end: CourEnd::Found {
                episode: episode - before,
                entry: current,
            },
        }
    }
}

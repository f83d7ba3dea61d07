//! Turns a planned update into calls against a tracking service

use crate::error::SyncError;
use crate::reconcile::{PlannedUpdate, RewatchCount};
use anisync_models::{CatalogEntry, IdentifierBundle, UpdateRequest, UpdateResult};
use anisync_sources::{SourceError, TrackingService};
use serde::Serialize;
use tracing::{error, info};

/// One call that went out, with what the service answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedUpdate {
    pub request: UpdateRequest,
    pub result: UpdateResult,
}

pub struct UpdateExecutor<'a> {
    service: &'a dyn TrackingService,
    ids: IdentifierBundle,
    is_show: bool,
}

impl<'a> UpdateExecutor<'a> {
    pub fn new(service: &'a dyn TrackingService, ids: IdentifierBundle, is_show: bool) -> Self {
        Self {
            service,
            ids,
            is_show,
        }
    }

    fn request(&self, entry: &CatalogEntry, update: &PlannedUpdate) -> UpdateRequest {
        UpdateRequest {
            anime_id: entry.id,
            alternative_id: entry.alternative_id.clone(),
            progress: update.episode_progress,
            status: update.target_status,
            is_rewatching: update.is_rewatching,
            rewatch_count: match update.rewatch_count {
                RewatchCount::SetTo(count) => Some(count),
                RewatchCount::Unchanged | RewatchCount::BumpFromResponse => None,
            },
            start_date: update.start_date,
            end_date: update.end_date,
            is_show: self.is_show,
            ids: self.ids,
        }
    }

    async fn send(&self, request: UpdateRequest) -> Result<AppliedUpdate, SyncError> {
        let name = self.service.service_name();
        match self.service.update_anime(&request).await {
            Ok(Some(result)) => Ok(AppliedUpdate { request, result }),
            Ok(None) => {
                error!(service = name, anime_id = request.anime_id, "Could not update anime status");
                Err(SyncError::external(
                    name,
                    SourceError::new("update returned no result"),
                ))
            }
            Err(e) => {
                error!(service = name, anime_id = request.anime_id, error = %e, "Update call failed");
                Err(SyncError::external(name, e))
            }
        }
    }

    /// Issue one call, or two when the rewatch count has to be read back
    /// from the first response
    pub async fn apply(
        &self,
        entry: &CatalogEntry,
        update: &PlannedUpdate,
    ) -> Result<Vec<AppliedUpdate>, SyncError> {
        let name = self.service.service_name();
        let first = self.send(self.request(entry, update)).await?;
        info!(
            service = name,
            title = entry.display_title(),
            status = %update.target_status,
            progress = update.episode_progress,
            "Updated list entry"
        );

        if update.rewatch_count != RewatchCount::BumpFromResponse {
            return Ok(vec![first]);
        }

        let mut follow_up = first.request.clone();
        follow_up.rewatch_count = Some(first.result.rewatch_count + 1);
        follow_up.start_date = None;
        follow_up.end_date = None;
        let second = self.send(follow_up).await?;
        info!(
            service = name,
            title = entry.display_title(),
            rewatch_count = second.result.rewatch_count,
            "Increased rewatch count"
        );

        Ok(vec![first, second])
    }
}

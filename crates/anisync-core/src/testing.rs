//! In-memory tracking service used by the unit tests

use anisync_models::{
    CatalogEntry, IdentifierBundle, ListStatus, RelationKind, Relation, UpdateRequest,
    UpdateResult,
};
use anisync_sources::{ServiceCapabilities, ServiceUser, SourceError, TrackingService};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) struct FakeService {
    name: String,
    capabilities: ServiceCapabilities,
    catalog: Mutex<HashMap<u64, CatalogEntry>>,
    search_results: Vec<CatalogEntry>,
    failing_ids: HashSet<u64>,
    external_match: Option<u64>,
    null_updates: bool,
    delay: Option<Duration>,
    pub updates: Mutex<Vec<UpdateRequest>>,
    pub fetches: Mutex<Vec<u64>>,
}

impl FakeService {
    pub fn new(name: &str, capabilities: ServiceCapabilities) -> Self {
        Self {
            name: name.to_string(),
            capabilities,
            catalog: Mutex::new(HashMap::new()),
            search_results: Vec::new(),
            failing_ids: HashSet::new(),
            external_match: None,
            null_updates: false,
            delay: None,
            updates: Mutex::new(Vec::new()),
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_entry(self, entry: CatalogEntry) -> Self {
        self.catalog.lock().unwrap().insert(entry.id, entry);
        self
    }

    /// Entry is returned by `search_anime` (without list status) and by `get_anime`
    pub fn with_searchable(mut self, entry: CatalogEntry) -> Self {
        let mut candidate = entry.clone();
        candidate.list_status = None;
        candidate.relations.clear();
        self.search_results.push(candidate);
        self.with_entry(entry)
    }

    pub fn failing(mut self, id: u64) -> Self {
        self.failing_ids.insert(id);
        self
    }

    pub fn matching_ids(mut self, id: u64) -> Self {
        self.external_match = Some(id);
        self
    }

    pub fn returning_no_updates(mut self) -> Self {
        self.null_updates = true;
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn updates(&self) -> Vec<UpdateRequest> {
        self.updates.lock().unwrap().clone()
    }

    pub fn list_status(&self, id: u64) -> Option<ListStatus> {
        self.catalog.lock().unwrap().get(&id).and_then(|e| e.list_status)
    }
}

#[async_trait]
impl TrackingService for FakeService {
    fn service_name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ServiceCapabilities {
        self.capabilities
    }

    async fn search_anime(&self, _query: &str) -> Result<Vec<CatalogEntry>, SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.search_results.clone())
    }

    async fn get_anime(
        &self,
        id: u64,
        include_related: bool,
    ) -> Result<Option<CatalogEntry>, SourceError> {
        self.fetches.lock().unwrap().push(id);
        if self.failing_ids.contains(&id) {
            return Err(SourceError::new(format!("{} unavailable", id)));
        }
        let mut entry = self.catalog.lock().unwrap().get(&id).cloned();
        if let Some(ref mut entry) = entry {
            if !include_related {
                entry.relations.clear();
            }
        }
        Ok(entry)
    }

    async fn update_anime(
        &self,
        request: &UpdateRequest,
    ) -> Result<Option<UpdateResult>, SourceError> {
        self.updates.lock().unwrap().push(request.clone());
        if self.null_updates {
            return Ok(None);
        }

        let mut catalog = self.catalog.lock().unwrap();
        let previous_count = catalog
            .get(&request.anime_id)
            .and_then(|e| e.list_status)
            .map(|s| s.rewatch_count)
            .unwrap_or(0);
        let rewatch_count = request.rewatch_count.unwrap_or(previous_count);
        if let Some(entry) = catalog.get_mut(&request.anime_id) {
            entry.list_status = Some(ListStatus {
                status: request.status,
                episodes_watched: request.progress,
                rewatch_count,
                is_rewatching: request.is_rewatching.unwrap_or(false),
            });
        }

        Ok(Some(UpdateResult {
            status: Some(request.status),
            progress: request.progress,
            rewatch_count,
        }))
    }

    async fn get_current_user(&self) -> Result<ServiceUser, SourceError> {
        Ok(ServiceUser {
            name: "tester".to_string(),
        })
    }

    async fn find_by_ids(
        &self,
        _ids: &IdentifierBundle,
        _title: &str,
    ) -> Result<Option<CatalogEntry>, SourceError> {
        let Some(id) = self.external_match else {
            return Ok(None);
        };
        Ok(self.catalog.lock().unwrap().get(&id).cloned())
    }
}

pub(crate) fn entry(id: u64, title: &str, total: u32) -> CatalogEntry {
    let mut entry = CatalogEntry::new(id, title);
    entry.total_episodes = total;
    entry
}

pub(crate) fn related(mut entry: CatalogEntry, kind: RelationKind, related_id: u64) -> CatalogEntry {
    entry.relations.push(Relation { kind, related_id });
    entry
}

use crate::error::SyncError;
use crate::filter::in_monitored_library;
use crate::id_lookup::{identify, IdBridge, Identification};
use crate::mapping::MappingTable;
use crate::mapping_store::MappingStore;
use crate::matching::find_match;
use crate::reconcile::{plan, ReconcileContext, ReconciliationDecision};
use crate::side_story::find_ova;
use crate::traversal::{CourEnd, SeasonTraversal};
use crate::update::{AppliedUpdate, UpdateExecutor};
use anisync_config::{Config, CredentialStore, ServiceKind, UserConfig};
use anisync_models::{CatalogEntry, MediaItem};
use anisync_sources::{ServiceFactoryRegistry, TrackingService};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Runs one playback event against every tracking service a user linked
pub struct SyncOrchestrator {
    config: Arc<Config>,
    registry: Arc<ServiceFactoryRegistry>,
    credentials: Arc<CredentialStore>,
    mapping: Option<Arc<MappingStore>>,
    bridge: IdBridge,
}

/// Why a whole event was not synced
#[derive(Debug)]
pub enum RunSkip {
    NotPlayedToCompletion,
    OutsideMonitoredLibrary,
    Configuration(SyncError),
}

/// What a service ended up doing for the played item
#[derive(Debug)]
pub struct ServiceDecision {
    pub anime_id: u64,
    pub title: String,
    pub episode: u32,
    pub decision: ReconciliationDecision,
}

#[derive(Debug)]
pub struct ServiceOutcome {
    pub service: ServiceKind,
    /// Every update call that succeeded, including seasons passed over
    pub calls: Vec<AppliedUpdate>,
    pub result: Result<ServiceDecision, SyncError>,
}

#[derive(Debug)]
pub struct SyncReport {
    pub user_id: String,
    pub title: String,
    pub identification: Identification,
    pub skipped: Option<RunSkip>,
    pub outcomes: Vec<ServiceOutcome>,
    pub duration: Duration,
}

impl SyncReport {
    fn skipped(user_id: &str, item: &MediaItem, reason: RunSkip, start: Instant) -> Self {
        Self {
            user_id: user_id.to_string(),
            title: item.title().to_string(),
            identification: Identification::default(),
            skipped: Some(reason),
            outcomes: Vec::new(),
            duration: start.elapsed(),
        }
    }

    pub fn outcome(&self, service: ServiceKind) -> Option<&ServiceOutcome> {
        self.outcomes.iter().find(|o| o.service == service)
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

impl SyncOrchestrator {
    pub fn new(
        config: Config,
        registry: ServiceFactoryRegistry,
        credentials: CredentialStore,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        registry.validate_all_configs(&config)?;

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            credentials: Arc::new(credentials),
            mapping: None,
            bridge: IdBridge::offline(),
        })
    }

    pub fn with_mapping_store(mut self, store: Arc<MappingStore>) -> Self {
        self.mapping = Some(store);
        self
    }

    pub fn with_bridge(mut self, bridge: IdBridge) -> Self {
        self.bridge = bridge;
        self
    }

    fn mapping_snapshot(&self) -> Arc<MappingTable> {
        match &self.mapping {
            Some(store) => store.snapshot(),
            None => Arc::new(MappingTable::empty()),
        }
    }

    /// Reconcile one played item for one user
    ///
    /// Never fails as a whole: configuration problems skip the event,
    /// per-service problems are recorded in that service's outcome.
    #[instrument(skip(self, item), fields(title = item.title()))]
    pub async fn synchronize(
        &self,
        item: &MediaItem,
        user_id: &str,
        played_to_completion: bool,
    ) -> SyncReport {
        let start = Instant::now();

        if !played_to_completion {
            debug!("Item not played to completion, nothing to sync");
            return SyncReport::skipped(user_id, item, RunSkip::NotPlayedToCompletion, start);
        }

        let Some(user) = self.config.user(user_id) else {
            warn!(user = user_id, "User is not configured, skipping");
            let err = SyncError::ConfigurationMissing(format!("user {} is not configured", user_id));
            return SyncReport::skipped(user_id, item, RunSkip::Configuration(err), start);
        };

        if !in_monitored_library(item, &user.library_paths) {
            info!("Item is outside the monitored libraries, skipping");
            return SyncReport::skipped(user_id, item, RunSkip::OutsideMonitoredLibrary, start);
        }

        let services = match self
            .registry
            .create_services_for_user(user, &self.config, &self.credentials)
            .await
        {
            Ok(services) if !services.is_empty() => services,
            Ok(_) => {
                warn!(user = user_id, "No authenticated tracking services, skipping");
                let err = SyncError::ConfigurationMissing(format!(
                    "user {} has no authenticated tracking services",
                    user_id
                ));
                return SyncReport::skipped(user_id, item, RunSkip::Configuration(err), start);
            }
            Err(e) => {
                warn!(user = user_id, error = %e, "Could not set up tracking services");
                let err = SyncError::ConfigurationMissing(format!("{:#}", e));
                return SyncReport::skipped(user_id, item, RunSkip::Configuration(err), start);
            }
        };

        let table = self.mapping_snapshot();
        let identification = identify(item, &table, &self.bridge).await;
        info!(
            kind = item.kind_label(),
            season = item.season_index(),
            episode = item.episode_index(),
            ids = %identification.ids,
            services = services.len(),
            "Syncing played item"
        );

        let now = Utc::now();
        let limit = self.config.sync.max_concurrent_services.max(1);
        let identification_ref = &identification;
        let mut outcomes: Vec<ServiceOutcome> = stream::iter(services)
            .map(|(kind, service)| self.run_service(kind, service, item, identification_ref, user, now))
            .buffer_unordered(limit)
            .collect()
            .await;
        outcomes.sort_by_key(|o| o.service);

        let report = SyncReport {
            user_id: user_id.to_string(),
            title: item.title().to_string(),
            identification,
            skipped: None,
            outcomes,
            duration: start.elapsed(),
        };
        info!(
            services = report.outcomes.len(),
            failures = report.failures(),
            duration_ms = report.duration.as_millis() as u64,
            "Sync finished"
        );
        report
    }

    #[instrument(skip_all, fields(service = %kind))]
    async fn run_service(
        &self,
        kind: ServiceKind,
        service: Arc<dyn TrackingService>,
        item: &MediaItem,
        identification: &Identification,
        user: &UserConfig,
        now: DateTime<Utc>,
    ) -> ServiceOutcome {
        let timeout_secs = self.config.sync.run_timeout_secs;
        let mut calls = Vec::new();
        let run = ServiceRun {
            service: service.as_ref(),
            item,
            identification,
            max_hops: self.config.sync.max_traversal_hops,
            ctx: ReconcileContext::new(service.capabilities())
                .plan_to_watch_only(user.plan_to_watch_only)
                .rewatch_completed(user.rewatch_completed),
            now,
        };

        let result = match tokio::time::timeout(Duration::from_secs(timeout_secs), run.execute(&mut calls)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout(timeout_secs)),
        };

        match &result {
            Ok(done) => debug!(anime_id = done.anime_id, calls = calls.len(), "Service synced"),
            Err(e) => warn!(error = %e, "Service sync step produced no update"),
        }

        ServiceOutcome {
            service: kind,
            calls,
            result,
        }
    }
}

/// Context threaded through one service's sync step
struct ServiceRun<'a> {
    service: &'a dyn TrackingService,
    item: &'a MediaItem,
    identification: &'a Identification,
    max_hops: u32,
    ctx: ReconcileContext,
    now: DateTime<Utc>,
}

impl<'a> ServiceRun<'a> {
    fn name(&self) -> &str {
        self.service.service_name()
    }

    async fn fetch(&self, id: u64) -> Result<CatalogEntry, SyncError> {
        match self.service.get_anime(id, false).await {
            Ok(Some(entry)) => Ok(entry),
            Ok(None) => Err(SyncError::ResolutionNotFound(format!(
                "{} has no anime {}",
                self.name(),
                id
            ))),
            Err(e) => Err(SyncError::external(self.name(), e)),
        }
    }

    async fn execute(&self, calls: &mut Vec<AppliedUpdate>) -> Result<ServiceDecision, SyncError> {
        if let Some((entry, episode)) = self.by_known_ids().await? {
            return self.reconcile(&entry, episode, self.ctx, calls).await;
        }

        let (entry, episode) = self.by_title(calls).await?;
        self.reconcile(&entry, episode, self.ctx, calls).await
    }

    /// Entry straight from the identifier bundle, skipping title search
    async fn by_known_ids(&self) -> Result<Option<(CatalogEntry, u32)>, SyncError> {
        if self.item.is_special() {
            return Ok(None);
        }
        let capabilities = self.service.capabilities();
        let ids = &self.identification.ids;
        let episode = self.identification.episode_for(self.item.episode_index());

        if let Some(native) = capabilities.native_catalog {
            if let Some(id) = ids.get(native) {
                info!(%native, id, episode, "Using known catalog id");
                return Ok(Some((self.fetch(id).await?, episode)));
            }
        }

        if capabilities.external_id_lookup && !ids.is_empty() {
            match self.service.find_by_ids(ids, self.item.title()).await {
                Ok(Some(entry)) => {
                    info!(anime_id = entry.id, "Found by external ids");
                    return Ok(Some((entry, episode)));
                }
                Ok(None) => debug!("No entry for external ids, falling back to title search"),
                Err(e) => return Err(SyncError::external(self.name(), e)),
            }
        }

        Ok(None)
    }

    /// Title search, then season, OVA or cour resolution
    async fn by_title(&self, calls: &mut Vec<AppliedUpdate>) -> Result<(CatalogEntry, u32), SyncError> {
        let title = self.item.title();
        let candidates = self
            .service
            .search_anime(title)
            .await
            .map_err(|e| SyncError::external(self.name(), e))?;

        let Some(matched) = find_match(&candidates, title) else {
            warn!(title, "Series not found");
            return Err(SyncError::ResolutionNotFound(format!("series not found: {}", title)));
        };
        info!(kind = self.item.kind_label(), found = matched.display_title(), "Found matching title");

        let MediaItem::Episode(episode) = self.item else {
            return Ok((self.fetch(matched.id).await?, 1));
        };
        let traversal = SeasonTraversal::new(self.service, self.max_hops);

        if episode.season_index > 1 {
            let season = traversal.find_season(matched.id, episode.season_index).await?;
            info!(season = season.display_title(), "Season being watched");
            return Ok((season, episode.episode_index));
        }

        if episode.season_index == 0 {
            let name = episode.episode_name.as_deref().unwrap_or_default();
            return match find_ova(self.service, matched.id, name).await? {
                Some(ova) => Ok((ova, episode.episode_index)),
                None => Err(SyncError::ResolutionNotFound(format!("OVA {:?} of {}", name, title))),
            };
        }

        if episode.episode_index <= matched.total_episodes {
            return Ok((self.fetch(matched.id).await?, episode.episode_index));
        }

        info!(
            episode = episode.episode_index,
            total = matched.total_episodes,
            "Episode runs past the season, checking later cours"
        );
        let walk = traversal.walk_cours(matched, episode.episode_index).await;
        let passed_over = self.ctx.override_rewatch_check(Some(false));
        for season in walk.consumed.iter().filter(|s| s.total_episodes > 0) {
            self.reconcile(season, season.total_episodes, passed_over, calls).await?;
        }

        match walk.end {
            CourEnd::Found { entry, episode } => Ok((entry, episode)),
            CourEnd::AiringRoot { entry } => Ok((entry, episode.episode_index)),
            CourEnd::DeadEnd(e) => Err(e),
        }
    }

    async fn reconcile(
        &self,
        entry: &CatalogEntry,
        episode: u32,
        ctx: ReconcileContext,
        calls: &mut Vec<AppliedUpdate>,
    ) -> Result<ServiceDecision, SyncError> {
        let decision = plan(entry, episode, &ctx, self.now);
        match &decision {
            ReconciliationDecision::NoOp { reason } => {
                info!(title = entry.display_title(), episode, %reason, "No update needed");
            }
            ReconciliationDecision::Update(update) => {
                let executor = UpdateExecutor::new(
                    self.service,
                    self.identification.ids,
                    self.item.is_episode(),
                );
                calls.extend(executor.apply(entry, update).await?);
            }
        }

        Ok(ServiceDecision {
            anime_id: entry.id,
            title: entry.display_title().to_string(),
            episode,
            decision,
        })
    }
}

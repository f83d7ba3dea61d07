use crate::error::MappingError;
use crate::mapping::MappingTable;
use anisync_sources::MappingFetcher;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Holds the current mapping table as an immutable snapshot
///
/// Readers clone the `Arc` and keep using their snapshot for the whole run;
/// a refresh swaps in a new table without touching snapshots already handed out.
pub struct MappingStore {
    path: PathBuf,
    refresh_interval: Duration,
    fetcher: Arc<dyn MappingFetcher>,
    current: RwLock<Arc<MappingTable>>,
}

impl MappingStore {
    pub fn new(path: PathBuf, fetcher: Arc<dyn MappingFetcher>, refresh_interval: Duration) -> Self {
        Self {
            path,
            refresh_interval,
            fetcher,
            current: RwLock::new(Arc::new(MappingTable::empty())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Arc<MappingTable> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    fn install(&self, table: MappingTable) -> usize {
        let rows = table.len();
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(table);
        rows
    }

    /// Parse the cached file into the current snapshot
    pub async fn load_cached(&self) -> Result<usize, MappingError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let table = MappingTable::parse(&bytes)?;
        let rows = self.install(table);
        debug!(path = %self.path.display(), rows, "Loaded cached mapping table");
        Ok(rows)
    }

    /// Download, validate, persist, then swap
    ///
    /// The cached file and the current snapshot are left untouched unless
    /// the download parses.
    pub async fn refresh(&self) -> Result<usize, MappingError> {
        let bytes = self.fetcher.fetch().await?;
        let table = MappingTable::parse(&bytes)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("xml.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        let rows = self.install(table);
        info!(
            operation = "mapping_refresh",
            path = %self.path.display(),
            rows,
            "Mapping table refreshed"
        );
        Ok(rows)
    }

    /// Cached file is missing or older than the refresh interval
    pub async fn is_stale(&self) -> bool {
        let modified = tokio::fs::metadata(&self.path)
            .await
            .and_then(|meta| meta.modified());
        match modified {
            Ok(modified) => SystemTime::now()
                .duration_since(modified)
                .map(|age| age >= self.refresh_interval)
                .unwrap_or(false),
            Err(_) => true,
        }
    }

    /// Best-effort load: refresh when stale, otherwise (or on failure) use
    /// the cached file. Returns whatever snapshot is current afterwards,
    /// which is empty if nothing could be loaded.
    pub async fn load_or_refresh(&self) -> Arc<MappingTable> {
        if self.is_stale().await {
            match self.refresh().await {
                Ok(_) => return self.snapshot(),
                Err(e) => warn!(error = %e, "Mapping table refresh failed, falling back to cached copy"),
            }
        }

        if self.snapshot().is_empty() {
            if let Err(e) = self.load_cached().await {
                warn!(
                    error = %e,
                    "Mapping table unavailable; resolution will rely on title search"
                );
            }
        }

        self.snapshot()
    }
}

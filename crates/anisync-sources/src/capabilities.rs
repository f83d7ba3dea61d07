/// Capability descriptors for tracking services
///
/// The reconciliation engine only branches on these flags, never on
/// which service it is talking to.
use anisync_config::ServiceKind;
use anisync_models::CatalogSource;
use serde::{Deserialize, Serialize};

/// How a service represents an in-progress rewatch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RewatchStyle {
    /// Status stays Completed, an `is_rewatching` flag carries the state
    #[default]
    CompletedFlag,
    /// The service has a distinct Rewatching status; starting a rewatch
    /// sends it together with the incremented rewatch count
    RewatchingStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceCapabilities {
    /// Whether the service distinguishes rewatches at all
    pub supports_rewatch: bool,
    pub rewatch_style: RewatchStyle,
    /// Status and rewatch count can be written in a single call. When false,
    /// finishing a rewatch takes two calls and the count comes from the
    /// first response.
    pub atomic_rewatch_count: bool,
    /// Catalog whose ids `get_anime` accepts directly
    pub native_catalog: Option<CatalogSource>,
    /// Service can resolve an entry from foreign catalog ids
    pub external_id_lookup: bool,
}

impl ServiceCapabilities {
    /// Minimal capability set: no rewatch handling, title search only
    pub fn basic() -> Self {
        Self {
            supports_rewatch: false,
            rewatch_style: RewatchStyle::CompletedFlag,
            atomic_rewatch_count: true,
            native_catalog: None,
            external_id_lookup: false,
        }
    }

    pub fn with_rewatch(mut self, style: RewatchStyle, atomic_count: bool) -> Self {
        self.supports_rewatch = true;
        self.rewatch_style = style;
        self.atomic_rewatch_count = atomic_count;
        self
    }

    pub fn with_native_catalog(mut self, catalog: CatalogSource) -> Self {
        self.native_catalog = Some(catalog);
        self
    }

    pub fn with_external_id_lookup(mut self) -> Self {
        self.external_id_lookup = true;
        self
    }

    /// Known behaviour of each supported service
    pub fn for_kind(kind: ServiceKind) -> Self {
        match kind {
            ServiceKind::Mal => Self::basic()
                .with_rewatch(RewatchStyle::CompletedFlag, false)
                .with_native_catalog(CatalogSource::MyAnimeList),
            ServiceKind::AniList => Self::basic()
                .with_rewatch(RewatchStyle::CompletedFlag, true)
                .with_native_catalog(CatalogSource::AniList),
            ServiceKind::Kitsu => Self::basic()
                .with_rewatch(RewatchStyle::RewatchingStatus, true)
                .with_native_catalog(CatalogSource::Kitsu),
            ServiceKind::Shikimori => {
                Self::basic().with_rewatch(RewatchStyle::CompletedFlag, true)
            }
            ServiceKind::Annict => Self::basic(),
            ServiceKind::Simkl => Self::basic().with_external_id_lookup(),
        }
    }
}

impl Default for ServiceCapabilities {
    fn default() -> Self {
        Self::basic()
    }
}

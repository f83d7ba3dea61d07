use crate::capabilities::ServiceCapabilities;
use crate::error::SourceError;
use anisync_models::{CatalogEntry, IdentifierBundle, UpdateRequest, UpdateResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceUser {
    pub name: String,
}

/// Uniform client for one tracking service (MAL, AniList, Kitsu, ...)
///
/// Implementations own transport and authentication. Every method is a
/// network round trip and a suspension point.
#[async_trait]
pub trait TrackingService: Send + Sync {
    fn service_name(&self) -> &str;

    fn capabilities(&self) -> ServiceCapabilities;

    /// Title search; candidates carry no list status
    async fn search_anime(&self, query: &str) -> Result<Vec<CatalogEntry>, SourceError>;

    /// Full entry including the user's list status, and relations when
    /// `include_related` is set. `None` when the id is unknown to the service.
    async fn get_anime(
        &self,
        id: u64,
        include_related: bool,
    ) -> Result<Option<CatalogEntry>, SourceError>;

    /// `None` means the service accepted the call but returned nothing usable
    async fn update_anime(
        &self,
        request: &UpdateRequest,
    ) -> Result<Option<UpdateResult>, SourceError>;

    async fn get_current_user(&self) -> Result<ServiceUser, SourceError>;

    /// Look an anime up by foreign catalog ids (for services that key on
    /// several catalogs at once)
    async fn find_by_ids(
        &self,
        _ids: &IdentifierBundle,
        _title: &str,
    ) -> Result<Option<CatalogEntry>, SourceError> {
        Ok(None)
    }
}

use crate::arm::api;
use crate::error::SourceError;
use anisync_models::{CatalogSource, IdentifierBundle};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Translates one catalog id into the ids of other catalogs
#[async_trait]
pub trait IdAggregator: Send + Sync {
    /// `Ok(None)` when the aggregator knows nothing about the id
    async fn lookup(
        &self,
        source: CatalogSource,
        id: u64,
    ) -> Result<Option<IdentifierBundle>, SourceError>;
}

#[derive(Clone)]
pub struct ArmClient {
    client: Arc<Client>,
    base_url: String,
}

impl ArmClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(concat!("anisync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client: Arc::new(client),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl IdAggregator for ArmClient {
    async fn lookup(
        &self,
        source: CatalogSource,
        id: u64,
    ) -> Result<Option<IdentifierBundle>, SourceError> {
        let Some(param) = api::source_param(source) else {
            debug!(%source, id, "Aggregator does not index this catalog");
            return Ok(None);
        };
        if id == 0 {
            return Ok(None);
        }

        let ids = api::get_ids(&self.client, &self.base_url, param, id).await?;
        Ok(ids.map(api::ArmIds::into_bundle))
    }
}

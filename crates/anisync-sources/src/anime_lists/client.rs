use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

/// Source of the raw mapping dataset
#[async_trait]
pub trait MappingFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError>;
}

#[derive(Clone)]
pub struct AnimeListsClient {
    client: Arc<Client>,
    url: String,
}

impl AnimeListsClient {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(concat!("anisync/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client: Arc::new(client),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MappingFetcher for AnimeListsClient {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        info!(url = %self.url, "Downloading anime mapping list");
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                service: "anime-lists".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(SourceError::new("Anime mapping list download was empty"));
        }
        Ok(bytes.to_vec())
    }
}

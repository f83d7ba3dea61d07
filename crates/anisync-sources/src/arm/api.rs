use crate::error::SourceError;
use anisync_models::{CatalogSource, IdentifierBundle};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

const SERVICE: &str = "arm";

/// `/api/v2/ids` response; every field may be null
#[derive(Debug, Default, Deserialize)]
pub struct ArmIds {
    #[serde(default)]
    pub anidb: Option<u64>,
    #[serde(default)]
    pub anilist: Option<u64>,
    #[serde(default)]
    pub kitsu: Option<u64>,
    #[serde(default)]
    pub myanimelist: Option<u64>,
}

impl ArmIds {
    pub fn into_bundle(self) -> IdentifierBundle {
        let mut bundle = IdentifierBundle::new();
        // set() drops zeros
        bundle.set(CatalogSource::AniDb, self.anidb.unwrap_or(0));
        bundle.set(CatalogSource::AniList, self.anilist.unwrap_or(0));
        bundle.set(CatalogSource::Kitsu, self.kitsu.unwrap_or(0));
        bundle.set(CatalogSource::MyAnimeList, self.myanimelist.unwrap_or(0));
        bundle
    }
}

/// Query parameter name for a catalog, None if the aggregator does not index it
pub fn source_param(source: CatalogSource) -> Option<&'static str> {
    match source {
        CatalogSource::AniList => Some("anilist"),
        CatalogSource::AniDb => Some("anidb"),
        CatalogSource::MyAnimeList => Some("myanimelist"),
        CatalogSource::Kitsu => Some("kitsu"),
        CatalogSource::Simkl => None,
    }
}

pub async fn get_ids(
    client: &Client,
    base_url: &str,
    source: &str,
    id: u64,
) -> Result<Option<ArmIds>, SourceError> {
    let url = format!("{}/api/v2/ids", base_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .query(&[("source", source.to_string()), ("id", id.to_string())])
        .header("Accept", "application/json")
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        debug!(source, id, "Aggregator has no entry");
        return Ok(None);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Status {
            service: SERVICE.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await?;
    parse_ids(&text)
}

/// The aggregator answers `null` for unknown ids
pub fn parse_ids(body: &str) -> Result<Option<ArmIds>, SourceError> {
    serde_json::from_str::<Option<ArmIds>>(body).map_err(|e| SourceError::decode(SERVICE, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids_full() {
        let body = r#"{"anidb":4563,"anilist":1535,"anime-planet":"death-note","kitsu":1376,"myanimelist":1535,"thetvdb":79481}"#;
        let bundle = parse_ids(body).unwrap().unwrap().into_bundle();
        assert_eq!(bundle.anidb, Some(4563));
        assert_eq!(bundle.anilist, Some(1535));
        assert_eq!(bundle.kitsu, Some(1376));
        assert_eq!(bundle.myanimelist, Some(1535));
        assert_eq!(bundle.simkl, None);
    }

    #[test]
    fn test_parse_ids_null_and_zero() {
        assert!(parse_ids("null").unwrap().is_none());

        let bundle = parse_ids(r#"{"anidb":0,"anilist":21,"kitsu":null}"#)
            .unwrap()
            .unwrap()
            .into_bundle();
        assert_eq!(bundle.anidb, None);
        assert_eq!(bundle.anilist, Some(21));
        assert_eq!(bundle.kitsu, None);
    }

    #[test]
    fn test_parse_ids_garbage() {
        assert!(matches!(parse_ids("<html>"), Err(SourceError::Decode { .. })));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalogs that tracking services key their entries by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    AniList,
    MyAnimeList,
    Kitsu,
    AniDb,
    Simkl,
}

impl CatalogSource {
    pub const ALL: [CatalogSource; 5] = [
        CatalogSource::AniList,
        CatalogSource::MyAnimeList,
        CatalogSource::Kitsu,
        CatalogSource::AniDb,
        CatalogSource::Simkl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSource::AniList => "anilist",
            CatalogSource::MyAnimeList => "myanimelist",
            CatalogSource::Kitsu => "kitsu",
            CatalogSource::AniDb => "anidb",
            CatalogSource::Simkl => "simkl",
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cross-catalog identifiers for one anime
///
/// A zero id is never stored: the setters drop it, so `None` is the only
/// representation of "unknown".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct IdentifierBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anilist: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub myanimelist: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kitsu: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anidb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simkl: Option<u64>,
}

impl IdentifierBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle holding a single known id
    pub fn only(source: CatalogSource, id: u64) -> Self {
        let mut bundle = Self::new();
        bundle.set(source, id);
        bundle
    }

    pub fn get(&self, source: CatalogSource) -> Option<u64> {
        match source {
            CatalogSource::AniList => self.anilist,
            CatalogSource::MyAnimeList => self.myanimelist,
            CatalogSource::Kitsu => self.kitsu,
            CatalogSource::AniDb => self.anidb,
            CatalogSource::Simkl => self.simkl,
        }
    }

    pub fn set(&mut self, source: CatalogSource, id: u64) {
        let value = (id != 0).then_some(id);
        match source {
            CatalogSource::AniList => self.anilist = value,
            CatalogSource::MyAnimeList => self.myanimelist = value,
            CatalogSource::Kitsu => self.kitsu = value,
            CatalogSource::AniDb => self.anidb = value,
            CatalogSource::Simkl => self.simkl = value,
        }
    }

    pub fn has(&self, source: CatalogSource) -> bool {
        self.get(source).is_some()
    }

    /// Fill ids missing here from `other`; known ids are never overwritten
    pub fn merge(&mut self, other: &IdentifierBundle) {
        for source in CatalogSource::ALL {
            if self.get(source).is_none() {
                if let Some(id) = other.get(source) {
                    self.set(source, id);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        CatalogSource::ALL.iter().all(|source| self.get(*source).is_none())
    }

    pub fn known(&self) -> impl Iterator<Item = (CatalogSource, u64)> + '_ {
        CatalogSource::ALL
            .into_iter()
            .filter_map(|source| self.get(source).map(|id| (source, id)))
    }
}

impl fmt::Display for IdentifierBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .known()
            .map(|(source, id)| format!("{}:{}", source, id))
            .collect();
        if parts.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(&parts.join(" "))
        }
    }
}

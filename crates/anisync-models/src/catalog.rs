use crate::status::{ListStatus, WatchStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AiringStatus {
    FinishedAiring,
    CurrentlyAiring,
    NotYetAired,
    #[default]
    Unknown,
}

/// How two catalog entries relate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Sequel,
    Prequel,
    SideStory,
    AlternativeVersion,
    AlternativeSetting,
    ParentStory,
    Summary,
    SpinOff,
    Other,
}

impl RelationKind {
    /// Relations that can point at an OVA or special
    pub const SIDE_STORY_LIKE: [RelationKind; 3] = [
        RelationKind::SideStory,
        RelationKind::AlternativeVersion,
        RelationKind::AlternativeSetting,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relation {
    pub kind: RelationKind,
    pub related_id: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlternativeTitles {
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub japanese: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// One anime on a tracking service, optionally with the user's list entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: u64,
    /// Secondary id some services need for writes (e.g. a list-entry id)
    #[serde(default)]
    pub alternative_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub alternative_titles: AlternativeTitles,
    /// 0 when the service does not know the length yet
    #[serde(default)]
    pub total_episodes: u32,
    #[serde(default)]
    pub airing_status: AiringStatus,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub list_status: Option<ListStatus>,
}

impl CatalogEntry {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            alternative_id: None,
            title: title.into(),
            alternative_titles: AlternativeTitles::default(),
            total_episodes: 0,
            airing_status: AiringStatus::Unknown,
            relations: Vec::new(),
            list_status: None,
        }
    }

    /// Title for log lines, preferring English when the service has one
    pub fn display_title(&self) -> &str {
        self.alternative_titles
            .english
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.title)
    }

    /// Every title the entry is known by, primary first
    pub fn all_titles(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title.as_str())
            .chain(self.alternative_titles.english.as_deref())
            .chain(self.alternative_titles.japanese.as_deref())
            .chain(self.alternative_titles.synonyms.iter().map(String::as_str))
    }

    pub fn first_sequel(&self) -> Option<u64> {
        self.relations
            .iter()
            .find(|r| r.kind == RelationKind::Sequel)
            .map(|r| r.related_id)
    }

    pub fn related<'a>(&'a self, kinds: &'a [RelationKind]) -> impl Iterator<Item = u64> + 'a {
        self.relations
            .iter()
            .filter(move |r| kinds.contains(&r.kind))
            .map(|r| r.related_id)
    }

    pub fn current_status(&self) -> Option<WatchStatus> {
        self.list_status.map(|s| s.status)
    }

    /// Episodes watched, 0 when there is no list entry
    pub fn watched_episodes(&self) -> u32 {
        self.list_status.map(|s| s.episodes_watched).unwrap_or(0)
    }

    pub fn is_airing(&self) -> bool {
        self.airing_status == AiringStatus::CurrentlyAiring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_prefers_english() {
        let mut entry = CatalogEntry::new(1, "Shingeki no Kyojin");
        assert_eq!(entry.display_title(), "Shingeki no Kyojin");
        entry.alternative_titles.english = Some("Attack on Titan".to_string());
        assert_eq!(entry.display_title(), "Attack on Titan");
    }

    #[test]
    fn test_first_sequel_skips_other_relations() {
        let mut entry = CatalogEntry::new(1, "Show");
        entry.relations = vec![
            Relation { kind: RelationKind::SideStory, related_id: 5 },
            Relation { kind: RelationKind::Sequel, related_id: 7 },
            Relation { kind: RelationKind::Sequel, related_id: 8 },
        ];
        assert_eq!(entry.first_sequel(), Some(7));
        let side: Vec<u64> = entry.related(&RelationKind::SIDE_STORY_LIKE).collect();
        assert_eq!(side, vec![5]);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized list status used across all tracking services
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    /// Want to watch (plan_to_watch on MAL, PLANNING on AniList, planned on Kitsu)
    PlanToWatch,
    /// Currently watching (CURRENT on AniList, current on Kitsu)
    Watching,
    /// Finished watching
    Completed,
    /// Watching again after completion (REPEATING on AniList)
    Rewatching,
    /// Paused
    OnHold,
    /// Stopped watching
    Dropped,
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WatchStatus::PlanToWatch => "plan_to_watch",
            WatchStatus::Watching => "watching",
            WatchStatus::Completed => "completed",
            WatchStatus::Rewatching => "rewatching",
            WatchStatus::OnHold => "on_hold",
            WatchStatus::Dropped => "dropped",
        };
        f.write_str(label)
    }
}

/// The user's entry for an anime on one service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListStatus {
    pub status: WatchStatus,
    #[serde(default)]
    pub episodes_watched: u32,
    #[serde(default)]
    pub rewatch_count: u32,
    #[serde(default)]
    pub is_rewatching: bool,
}

impl ListStatus {
    pub fn new(status: WatchStatus, episodes_watched: u32) -> Self {
        Self {
            status,
            episodes_watched,
            rewatch_count: 0,
            is_rewatching: false,
        }
    }

    /// Either flavour of "currently rewatching" a service may report
    pub fn is_rewatch_in_progress(&self) -> bool {
        self.is_rewatching || self.status == WatchStatus::Rewatching
    }
}

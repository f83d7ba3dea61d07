use crate::ids::IdentifierBundle;
use crate::status::WatchStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Write request sent to a tracking service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateRequest {
    pub anime_id: u64,
    #[serde(default)]
    pub alternative_id: Option<String>,
    pub progress: u32,
    pub status: WatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_rewatching: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewatch_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Episode-based media (as opposed to a movie)
    pub is_show: bool,
    #[serde(default)]
    pub ids: IdentifierBundle,
}

/// What the service reports back after a write
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateResult {
    #[serde(default)]
    pub status: Option<WatchStatus>,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub rewatch_count: u32,
}

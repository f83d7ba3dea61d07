use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_MAPPING_URL: &str =
    "https://raw.githubusercontent.com/Anime-Lists/anime-lists/master/anime-list-full.xml";
pub const DEFAULT_BRIDGE_URL: &str = "https://arm.haglund.dev";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub sync: SyncOptions,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// Where the AniDB↔TVDB dataset comes from and how long a download stays fresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default = "default_mapping_url")]
    pub url: String,
    #[serde(default = "default_refresh_interval_hours")]
    pub refresh_interval_hours: u64,
    /// Overrides the cached file location (defaults to the data dir)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            url: default_mapping_url(),
            refresh_interval_hours: default_refresh_interval_hours(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_bridge_url")]
    pub base_url: String,
    #[serde(default = "default_bridge_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_bridge_url(),
            timeout_secs: default_bridge_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Upper bound on tracking services reconciled at the same time
    #[serde(default = "default_max_concurrent_services")]
    pub max_concurrent_services: usize,
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
    /// Hard ceiling for sequel-chain walks
    #[serde(default = "default_max_traversal_hops")]
    pub max_traversal_hops: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_concurrent_services: default_max_concurrent_services(),
            run_timeout_secs: default_run_timeout_secs(),
            max_traversal_hops: default_max_traversal_hops(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            page_delay_ms: default_page_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub user_id: String,
    /// Only touch anime the user already has as plan-to-watch
    #[serde(default)]
    pub plan_to_watch_only: bool,
    /// Start a rewatch when a completed anime is played again
    #[serde(default)]
    pub rewatch_completed: bool,
    /// Library folders to sync from; empty means every folder
    #[serde(default)]
    pub library_paths: Vec<PathBuf>,
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

impl UserConfig {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            plan_to_watch_only: false,
            rewatch_completed: false,
            library_paths: Vec::new(),
            services: Vec::new(),
        }
    }

    pub fn enabled_services(&self) -> impl Iterator<Item = ServiceKind> + '_ {
        self.services.iter().filter(|s| s.enabled).map(|s| s.kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub kind: ServiceKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Tracking services a user can link
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Mal,
    AniList,
    Kitsu,
    Annict,
    Shikimori,
    Simkl,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 6] = [
        ServiceKind::Mal,
        ServiceKind::AniList,
        ServiceKind::Kitsu,
        ServiceKind::Annict,
        ServiceKind::Shikimori,
        ServiceKind::Simkl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Mal => "mal",
            ServiceKind::AniList => "anilist",
            ServiceKind::Kitsu => "kitsu",
            ServiceKind::Annict => "annict",
            ServiceKind::Shikimori => "shikimori",
            ServiceKind::Simkl => "simkl",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown service: {}", s))
    }
}

fn default_true() -> bool {
    true
}

fn default_mapping_url() -> String {
    DEFAULT_MAPPING_URL.to_string()
}

fn default_refresh_interval_hours() -> u64 {
    24
}

fn default_bridge_url() -> String {
    DEFAULT_BRIDGE_URL.to_string()
}

fn default_bridge_timeout_secs() -> u64 {
    10
}

fn default_max_concurrent_services() -> usize {
    4
}

fn default_run_timeout_secs() -> u64 {
    120
}

fn default_max_traversal_hops() -> u32 {
    16
}

fn default_max_pages() -> u32 {
    10
}

fn default_page_delay_ms() -> u64 {
    1000
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mapping.url.trim().is_empty() {
            return Err(anyhow::anyhow!("mapping.url cannot be empty"));
        }
        if self.mapping.refresh_interval_hours == 0 {
            return Err(anyhow::anyhow!("mapping.refresh_interval_hours must be at least 1"));
        }
        if self.bridge.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("bridge.base_url cannot be empty"));
        }
        if self.sync.max_concurrent_services == 0 {
            return Err(anyhow::anyhow!("sync.max_concurrent_services must be at least 1"));
        }
        if self.sync.run_timeout_secs == 0 {
            return Err(anyhow::anyhow!("sync.run_timeout_secs must be at least 1"));
        }
        if self.sync.max_traversal_hops == 0 {
            return Err(anyhow::anyhow!("sync.max_traversal_hops must be at least 1"));
        }
        if self.search.max_pages == 0 {
            return Err(anyhow::anyhow!("search.max_pages must be at least 1"));
        }

        let mut seen = std::collections::HashSet::new();
        for user in &self.users {
            if user.user_id.trim().is_empty() {
                return Err(anyhow::anyhow!("users.user_id cannot be empty"));
            }
            if !seen.insert(user.user_id.as_str()) {
                return Err(anyhow::anyhow!("Duplicate user_id: {}", user.user_id));
            }
            let mut kinds = std::collections::HashSet::new();
            for service in &user.services {
                if !kinds.insert(service.kind) {
                    return Err(anyhow::anyhow!(
                        "Service {} is listed twice for user {}",
                        service.kind,
                        user.user_id
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn user(&self, user_id: &str) -> Option<&UserConfig> {
        self.users.iter().find(|u| u.user_id == user_id)
    }

    /// Starter configuration written by `config init`
    pub fn example() -> Self {
        let mut user = UserConfig::new("default");
        user.services = vec![
            ServiceConfig { kind: ServiceKind::AniList, enabled: true },
            ServiceConfig { kind: ServiceKind::Mal, enabled: false },
        ];
        Self {
            users: vec![user],
            ..Self::default()
        }
    }
}

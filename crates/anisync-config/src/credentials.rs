use crate::config::ServiceKind;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Token set for one user on one tracking service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ServiceToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// On-disk layout: one `[users.<user>.<service>]` table per token
#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    users: BTreeMap<String, BTreeMap<String, ServiceToken>>,
}

/// Per-user tokens persisted as `credentials.toml`
pub struct CredentialStore {
    path: PathBuf,
    data: CredentialsFile,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: CredentialsFile::default(),
        }
    }

    /// A missing file leaves the store empty
    pub fn load(&mut self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        self.data = toml::from_str(&content)
            .with_context(|| format!("Malformed credentials file {}", self.path.display()))?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&self.data)?;
        let staging = self.path.with_extension("toml.tmp");
        std::fs::write(&staging, content)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }

    /// Stored token, ignoring entries with an empty access token
    pub fn token(&self, user_id: &str, service: ServiceKind) -> Option<ServiceToken> {
        self.data
            .users
            .get(user_id)?
            .get(service.as_str())
            .filter(|token| !token.access_token.is_empty())
            .cloned()
    }

    pub fn set_token(&mut self, user_id: &str, service: ServiceKind, token: &ServiceToken) {
        self.data
            .users
            .entry(user_id.to_string())
            .or_default()
            .insert(service.as_str().to_string(), token.clone());
    }

    pub fn remove_token(&mut self, user_id: &str, service: ServiceKind) {
        if let Some(tokens) = self.data.users.get_mut(user_id) {
            tokens.remove(service.as_str());
            if tokens.is_empty() {
                self.data.users.remove(user_id);
            }
        }
    }

    /// Whether the user linked this service at all
    pub fn is_authenticated(&self, user_id: &str, service: ServiceKind) -> bool {
        self.token(user_id, service).is_some()
    }

    /// Services the user holds a token for
    pub fn linked_services(&self, user_id: &str) -> Vec<ServiceKind> {
        ServiceKind::ALL
            .into_iter()
            .filter(|kind| self.is_authenticated(user_id, *kind))
            .collect()
    }
}

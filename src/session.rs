//! Persisted session preferences
//!
//! A small key-value file next to the database: who is logged in and the
//! last-used city/district, so entry creation can re-offer the location
//! instead of re-prompting every time. An empty string means "unset".

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const SESSION_FILE: &str = "session.json";

/// Hash recorded on entries created before any login
pub const FALLBACK_CREATOR_HASH: &str = "stub-hash";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionData {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    user_hash: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    district: String,
    #[serde(default)]
    logged_at: i64,
}

pub struct SessionStore {
    path: PathBuf,
    data: SessionData,
}

impl SessionStore {
    /// Load session preferences from `dir`, defaulting to an empty session
    /// when the file is missing or unreadable.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(SESSION_FILE);
        let data = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path, data }
    }

    /// Record the user identity; the creator hash stamped on entries is the
    /// SHA-256 hex digest of the user id.
    pub fn login(&mut self, user_id: &str) -> Result<String> {
        let hash = hex::encode(Sha256::digest(user_id.as_bytes()));
        self.data.user_id = user_id.to_string();
        self.data.user_hash = hash.clone();
        self.data.logged_at = Utc::now().timestamp_millis();
        self.save()?;
        Ok(hash)
    }

    pub fn user_id(&self) -> Option<&str> {
        non_blank(&self.data.user_id)
    }

    /// Hash to stamp on new entries; never empty
    pub fn creator_hash(&self) -> String {
        non_blank(&self.data.user_hash)
            .unwrap_or(FALLBACK_CREATOR_HASH)
            .to_string()
    }

    /// Remember the confirmed location for the next entry
    pub fn set_location(&mut self, city: &str, district: &str) -> Result<()> {
        self.data.city = city.to_string();
        self.data.district = district.to_string();
        self.data.logged_at = Utc::now().timestamp_millis();
        self.save()
    }

    pub fn city(&self) -> Option<&str> {
        non_blank(&self.data.city)
    }

    pub fn district(&self) -> Option<&str> {
        non_blank(&self.data.district)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.data = SessionData::default();
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

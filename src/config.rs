//! Configuration management with YAML support

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::capture::CancelPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub photos: PhotoConfig,

    #[serde(default)]
    pub exports: ExportConfig,

    #[serde(default)]
    pub form: FormConfig,
}

/// Database location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Photo staging and library directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoConfig {
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,

    #[serde(default = "default_library_dir")]
    pub library_dir: String,
}

/// Export output directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub dir: String,
}

/// Form-flow policy knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    /// An empty category→material allow-list means "offer every material"
    /// when true, "offer none" when false.
    #[serde(default = "default_enabled")]
    pub empty_allow_list_shows_all: bool,

    /// Cancelling the far photo keeps the already-accepted near photo
    /// when true, discards both when false.
    #[serde(default = "default_enabled")]
    pub cancel_far_retains_near: bool,

    #[serde(default = "default_city_suggestions")]
    pub city_suggestions: Vec<String>,

    #[serde(default = "default_district_suggestions")]
    pub district_suggestions: Vec<String>,
}

// Default value functions
fn default_database_path() -> String {
    "~/.local/share/fieldnote/fieldnote.db".to_string()
}

fn default_staging_dir() -> String {
    "~/.cache/fieldnote/staging".to_string()
}

fn default_library_dir() -> String {
    "~/.local/share/fieldnote/photos".to_string()
}

fn default_export_dir() -> String {
    "~/.local/share/fieldnote/exports".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_city_suggestions() -> Vec<String> {
    ["Berlin", "Hamburg", "München", "Köln", "Frankfurt", "Düsseldorf", "Stuttgart"]
        .map(String::from)
        .to_vec()
}

fn default_district_suggestions() -> Vec<String> {
    ["Mitte", "Nord", "Süd", "Ost", "West"].map(String::from).to_vec()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            library_dir: default_library_dir(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            empty_allow_list_shows_all: true,
            cancel_far_retains_near: true,
            city_suggestions: default_city_suggestions(),
            district_suggestions: default_district_suggestions(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            photos: PhotoConfig::default(),
            exports: ExportConfig::default(),
            form: FormConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./fieldnote.yaml (current directory)
    /// 3. ~/.config/fieldnote/fieldnote.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "fieldnote.yaml".to_string(),
            shellexpand::tilde("~/.config/fieldnote/fieldnote.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Get the database path, expanding ~ to home directory
    pub fn database_path(&self) -> PathBuf {
        expand(&self.storage.path)
    }

    /// Directory holding the database and the session preferences file
    pub fn data_dir(&self) -> PathBuf {
        self.database_path()
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn staging_dir(&self) -> PathBuf {
        expand(&self.photos.staging_dir)
    }

    pub fn library_dir(&self) -> PathBuf {
        expand(&self.photos.library_dir)
    }

    pub fn export_dir(&self) -> PathBuf {
        expand(&self.exports.dir)
    }

    pub fn cancel_policy(&self) -> CancelPolicy {
        if self.form.cancel_far_retains_near {
            CancelPolicy::RetainNear
        } else {
            CancelPolicy::DiscardAll
        }
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

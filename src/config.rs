//! Configuration loading.
//!
//! Lookup order, first hit wins:
//! 1. an explicit `--config` path
//! 2. `$TASKS_BACKUP_CONFIG`
//! 3. `./tasks-backup/config.yaml`
//! 4. `~/.tasks-backup/config.yaml`
//!
//! With no file the defaults apply. `TASKS_BACKUP_DB_PATH` then overrides the
//! database path, and CLI flags override everything.

use crate::db::import::DEFAULT_THEME_COLOR_INDEX;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_ENV: &str = "TASKS_BACKUP_CONFIG";
pub const DB_PATH_ENV: &str = "TASKS_BACKUP_DB_PATH";
const CONFIG_DIR: &str = "tasks-backup";
const HOME_CONFIG_DIR: &str = ".tasks-backup";
const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub import: ImportConfig,
}

/// Where the datastore lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tasks-backup/tasks.db")
}

/// Import tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Palette index assumed for the theme colour when old backups lack one.
    #[serde(default = "default_theme_color")]
    pub theme_color_default: i32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            theme_color_default: default_theme_color(),
        }
    }
}

fn default_theme_color() -> i32 {
    DEFAULT_THEME_COLOR_INDEX
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Load the first candidate that exists, or defaults when none does.
    pub fn load_first(candidates: &[PathBuf]) -> Result<Self> {
        for path in candidates {
            if path.is_file() {
                debug!(path = %path.display(), "loading config");
                return Self::load(path);
            }
        }
        Ok(Self::default())
    }

    /// Resolve configuration from the standard locations and environment.
    ///
    /// An explicit path must exist.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => Self::load_first(&default_candidates())?,
        };
        config.apply_db_path_override(std::env::var(DB_PATH_ENV).ok());
        Ok(config)
    }

    /// Replace the database path when an override is set and non-empty.
    pub fn apply_db_path_override(&mut self, db_path: Option<String>) {
        if let Some(db_path) = db_path.filter(|p| !p.is_empty()) {
            self.storage.db_path = PathBuf::from(db_path);
        }
    }
}

fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        candidates.push(PathBuf::from(path));
    }
    candidates.push(Path::new(CONFIG_DIR).join(CONFIG_FILE));
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(HOME_CONFIG_DIR).join(CONFIG_FILE));
    }
    candidates
}

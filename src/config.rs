//! Configuration file handling
//!
//! ```toml
//! user_id = "6a1c0c52-5f0e-4bd6-9a7e-3d8c5b7b1f04"
//! database_path = "/home/me/.local/share/boksen/boksen.db"   # optional
//!
//! [scheduler]
//! max_pick_attempts = 3
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine the {0} directory")]
    DirNotFound(&'static str),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Tuning for the term picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How many snapshot-and-sample rounds a pick may take before giving up.
    /// Values below 1 are treated as 1.
    #[serde(default = "default_max_pick_attempts")]
    pub max_pick_attempts: u32,
}

fn default_max_pick_attempts() -> u32 {
    3
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_pick_attempts: default_max_pick_attempts(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Identity that owns the decks created from this machine
    pub user_id: Uuid,
    /// Database file; defaults to `boksen.db` in the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            database_path: None,
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Default config file location (e.g., ~/.config/boksen/config.toml)
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("boksen").join("config.toml"))
            .ok_or(ConfigError::DirNotFound("config"))
    }

    /// Default data directory (e.g., ~/.local/share/boksen)
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("boksen"))
            .ok_or(ConfigError::DirNotFound("data"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Read the config at `path`, writing a fresh one (with a new user id)
    /// if the file does not exist yet
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        let config = Self::default();
        config.save(path)?;
        log::info!("Created config {:?} for user {}", path, config.user_id);
        Ok(config)
    }

    /// Database file to open: the configured one or the default location
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::default_data_dir()?.join("boksen.db")),
        }
    }
}

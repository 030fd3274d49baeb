use crate::error::{CycleError, Result};
use crate::paths;
use crate::types::ListRole;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// IndexConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Closed cycles older than this many days are hidden from listings.
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: u32,
    #[serde(default)]
    pub default_role: ListRole,
}

/// Roughly a century; longer windows are treated as misconfiguration.
pub const MAX_RECENT_WINDOW_DAYS: u32 = 36_500;

fn default_recent_window_days() -> u32 {
    31
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            recent_window_days: default_recent_window_days(),
            default_role: ListRole::All,
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub index: IndexConfig,
}

fn default_version() -> u32 {
    1
}

fn default_database() -> String {
    paths::DEFAULT_DATABASE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database: default_database(),
            index: IndexConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(CycleError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn database_path(&self, root: &Path) -> PathBuf {
        paths::database_path(root, &self.database)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version != 1 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("unsupported config version {}", self.version),
            });
        }

        if self.database.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "database path is empty".to_string(),
            });
        }

        if self.index.recent_window_days == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "index.recent_window_days is 0: only open, upcoming and undated cycles will be listed"
                    .to_string(),
            });
        }

        if self.index.recent_window_days > MAX_RECENT_WINDOW_DAYS {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "index.recent_window_days is {}: must be at most {MAX_RECENT_WINDOW_DAYS}",
                    self.index.recent_window_days
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Configuration management

use crate::domain::retention::{RetentionWindow, DEFAULT_RETENTION_HOURS};
use crate::error::{DaybookError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the directory that marks a daybook root
pub const DAYBOOK_DIR: &str = ".daybook";

/// What happens to a draft once it has been saved as a final entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionPolicy {
    /// Leave the draft in place; it can be promoted again
    #[default]
    Keep,
    /// Delete the draft after the entry is written
    Delete,
}

impl FromStr for PromotionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep" => Ok(PromotionPolicy::Keep),
            "delete" => Ok(PromotionPolicy::Delete),
            _ => Err(format!(
                "Invalid on_promote value: '{}'. Valid values are: keep, delete",
                s
            )),
        }
    }
}

impl fmt::Display for PromotionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromotionPolicy::Keep => f.write_str("keep"),
            PromotionPolicy::Delete => f.write_str("delete"),
        }
    }
}

fn default_retention_hours() -> u32 {
    DEFAULT_RETENTION_HOURS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u32,
    #[serde(default)]
    pub on_promote: PromotionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    pub created: DateTime<Utc>,
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Self {
        Config {
            retention_hours: DEFAULT_RETENTION_HOURS,
            on_promote: PromotionPolicy::Keep,
            export_dir: None,
            created: Utc::now(),
        }
    }

    pub fn retention(&self) -> RetentionWindow {
        RetentionWindow::from_hours(self.retention_hours)
    }

    /// Load config from .daybook/config.toml in the given directory
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(DAYBOOK_DIR).join("config.toml");

        let contents = fs::read_to_string(&config_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DaybookError::NotDaybookDirectory(path.to_path_buf())
            } else {
                DaybookError::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| DaybookError::Config(format!("Failed to parse config.toml: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to .daybook/config.toml in the given directory
    pub fn save_to_dir(&self, path: &Path) -> Result<()> {
        let daybook_dir = path.join(DAYBOOK_DIR);
        let config_path = daybook_dir.join("config.toml");

        if !daybook_dir.exists() {
            fs::create_dir(&daybook_dir)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| DaybookError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, contents)?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.retention_hours == 0 {
            return Err(DaybookError::Config(
                "retention_hours must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory exports are written to, checking the environment first
    pub fn get_export_dir(&self) -> PathBuf {
        std::env::var_os("DAYBOOK_EXPORT_DIR")
            .map(PathBuf::from)
            .or_else(|| self.export_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

//! Config management use case

use crate::error::{DaybookError, Result};
use crate::infrastructure::{Config, JournalRepository, PromotionPolicy};
use std::path::PathBuf;
use std::str::FromStr;

const SETTABLE_KEYS: &str = "retention_hours, on_promote, export_dir";

/// Service for reading and changing daybook configuration
pub struct ConfigService<R: JournalRepository> {
    repository: R,
}

impl<R: JournalRepository> ConfigService<R> {
    pub fn new(repository: R) -> Self {
        ConfigService { repository }
    }

    /// Get a single config value
    pub fn get(&self, key: &str) -> Result<String> {
        let config = self.repository.load_config()?;

        match key {
            "retention_hours" => Ok(config.retention_hours.to_string()),
            "on_promote" => Ok(config.on_promote.to_string()),
            "export_dir" => Ok(config
                .export_dir
                .map(|dir| dir.display().to_string())
                .unwrap_or_default()),
            "created" => Ok(config.created.to_rfc3339()),
            _ => Err(DaybookError::Config(format!(
                "Unknown config key: '{}'. Valid keys are: {}, created",
                key, SETTABLE_KEYS
            ))),
        }
    }

    /// Set a config value. An empty `export_dir` clears it.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.repository.load_config()?;

        match key {
            "retention_hours" => {
                config.retention_hours = value.trim().parse().map_err(|_| {
                    DaybookError::Config(format!(
                        "Invalid retention_hours value: '{}'. Expected a whole number of hours",
                        value
                    ))
                })?;
            }
            "on_promote" => {
                config.on_promote = PromotionPolicy::from_str(value).map_err(DaybookError::Config)?;
            }
            "export_dir" => {
                config.export_dir = if value.trim().is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "created" => {
                return Err(DaybookError::Config(
                    "Cannot modify 'created' field (read-only)".to_string(),
                ));
            }
            _ => {
                return Err(DaybookError::Config(format!(
                    "Unknown config key: '{}'. Valid keys are: {}",
                    key, SETTABLE_KEYS
                )));
            }
        }

        config.validate()?;
        self.repository.save_config(&config)
    }

    /// List all config values
    pub fn list(&self) -> Result<Config> {
        self.repository.load_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::init::init;
    use crate::infrastructure::LocalBackend;
    use tempfile::TempDir;

    fn service(temp: &TempDir) -> ConfigService<LocalBackend> {
        init(temp.path()).unwrap();
        ConfigService::new(LocalBackend::new(temp.path().to_path_buf()))
    }

    #[test]
    fn test_defaults() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);

        assert_eq!(service.get("retention_hours").unwrap(), "24");
        assert_eq!(service.get("on_promote").unwrap(), "keep");
        assert_eq!(service.get("export_dir").unwrap(), "");
    }

    #[test]
    fn test_set_and_get() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);

        service.set("retention_hours", "48").unwrap();
        service.set("on_promote", "DELETE").unwrap();
        service.set("export_dir", "/tmp/out").unwrap();

        assert_eq!(service.get("retention_hours").unwrap(), "48");
        assert_eq!(service.get("on_promote").unwrap(), "delete");
        assert_eq!(service.get("export_dir").unwrap(), "/tmp/out");

        service.set("export_dir", "").unwrap();
        assert!(service.list().unwrap().export_dir.is_none());
    }

    #[test]
    fn test_invalid_values_leave_config_unchanged() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);

        assert!(service.set("retention_hours", "soon").is_err());
        assert!(service.set("retention_hours", "0").is_err());
        assert!(service.set("on_promote", "archive").is_err());
        assert_eq!(service.get("retention_hours").unwrap(), "24");
        assert_eq!(service.get("on_promote").unwrap(), "keep");
    }

    #[test]
    fn test_created_is_read_only() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);

        assert!(service.get("created").is_ok());
        let err = service.set("created", "2020-01-01T00:00:00Z").unwrap_err();
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_unknown_key() {
        let temp = TempDir::new().unwrap();
        let service = service(&temp);

        let err = service.get("editor").unwrap_err();
        assert!(err.to_string().contains("Unknown config key: 'editor'"));
    }
}

//! Initialize daybook use case

use crate::error::Result;
use crate::infrastructure::{Config, JournalRepository, LocalBackend};
use std::fs;
use std::path::Path;
use tracing::info;

/// Initialize a new daybook at the specified path and return its config.
pub fn init(path: &Path) -> Result<Config> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }

    let repo = LocalBackend::new(path.to_path_buf());
    repo.initialize()?;

    let config = Config::new();
    repo.save_config(&config)?;

    info!(root = %path.display(), "initialized daybook");
    Ok(config)
}

//! Unified path management for Claire's local files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/claire/           # Config directory (dirs::config_dir)
//! ├── config.toml             # Application configuration
//! └── store.json              # Persisted key/value store
//! ```

use claire_core::error::{ClaireError, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "claire";
const CONFIG_FILE: &str = "config.toml";
const STORE_FILE: &str = "store.json";

/// Resolved locations of Claire's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClairePaths {
    base_dir: PathBuf,
}

impl ClairePaths {
    /// Resolves the platform config directory.
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ClaireError::config("Cannot find config directory"))?;
        Ok(Self::with_base_dir(config_dir.join(APP_DIR)))
    }

    /// Uses `base_dir` instead of the platform directory (tests, `--data-dir`).
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE)
    }

    pub fn store_file(&self) -> PathBuf {
        self.base_dir.join(STORE_FILE)
    }
}

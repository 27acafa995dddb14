//! Configuration service.
//!
//! Loads [`ClaireConfig`] from `config.toml` and applies environment
//! overrides. A missing file yields defaults; a malformed one is an error.

use claire_core::config::ClaireConfig;
use claire_core::error::Result;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Environment variable overriding `backend.base_url`.
pub const BASE_URL_ENV: &str = "CLAIRE_API_BASE_URL";

#[derive(Debug, Clone)]
pub struct ConfigService {
    config_path: PathBuf,
}

impl ConfigService {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Reads the file (if present) and applies environment overrides.
    pub fn load(&self) -> Result<ClaireConfig> {
        let mut config = self.load_file()?;
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            apply_base_url_override(&mut config, &base_url);
        }
        Ok(config)
    }

    fn load_file(&self) -> Result<ClaireConfig> {
        if !self.config_path.exists() {
            debug!("[Config] No config at {:?}, using defaults", self.config_path);
            return Ok(ClaireConfig::default());
        }
        let content = fs::read_to_string(&self.config_path)?;
        let config = ClaireConfig::from_toml_str(&content)?;
        info!("[Config] Loaded {:?}", self.config_path);
        Ok(config)
    }
}

fn apply_base_url_override(config: &mut ClaireConfig, base_url: &str) {
    let base_url = base_url.trim();
    if base_url.is_empty() {
        return;
    }
    info!("[Config] {} overrides base URL: {}", BASE_URL_ENV, base_url);
    config.backend.base_url = base_url.to_string();
}

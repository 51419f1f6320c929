//! Configuration handling for the browsing engine.
//!
//! Configuration is stored in `.capedeck/config.yaml` and includes:
//! - Page size for server-paginated browse requests
//! - Batch size cap for favorite lookups
//! - The current user identity used for the "owned" view

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{DEFAULT_PAGE_SIZE, MAX_LOOKUP_IDS};
use crate::error::{CatalogError, Result};

pub const CONFIG_DIR: &str = ".capedeck";

const IDENTITY_ENV: &str = "CAPEDECK_IDENTITY";
const PAGE_SIZE_ENV: &str = "CAPEDECK_PAGE_SIZE";

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_lookup_batch_limit() -> usize {
    MAX_LOOKUP_IDS
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Items requested per browse page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Ids sent per favorite lookup call (backend caps this at 100)
    #[serde(default = "default_lookup_batch_limit")]
    pub lookup_batch_limit: usize,

    /// Identity whose items back the "owned" view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            lookup_batch_limit: MAX_LOOKUP_IDS,
            identity: None,
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        PathBuf::from(CONFIG_DIR).join("config.yaml")
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, falling back to defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path)?;
            Self::from_yaml(&content)?
        } else {
            Config::default()
        };
        config.with_env_overrides()
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: Config = serde_yaml_ng::from_str(content)?;
        if config.page_size == 0 {
            return Err(CatalogError::Config(
                "page_size must be greater than zero".to_string(),
            ));
        }
        config.lookup_batch_limit = config.lookup_batch_limit.clamp(1, MAX_LOOKUP_IDS);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(identity) = env::var(IDENTITY_ENV)
            && !identity.is_empty()
        {
            self.identity = Some(identity);
        }

        if let Ok(raw) = env::var(PAGE_SIZE_ENV) {
            match raw.parse::<u32>() {
                Ok(size) if size > 0 => self.page_size = size,
                _ => {
                    return Err(CatalogError::Config(format!(
                        "{PAGE_SIZE_ENV} must be a positive integer, got '{raw}'"
                    )));
                }
            }
        }

        Ok(self)
    }

    /// Identity for the "owned" view, if one is configured
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref().filter(|s| !s.is_empty())
    }
}

//! Configuration management for esmap
//!
//! Config files are TOML:
//!
//! ```toml
//! [resources]
//! root = "~/.esmap/resources"
//!
//! [index]
//! default_shards = 1
//! default_replicas = 1
//! default_refresh_interval = "1s"
//! default_store_type = "fs"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::resource::ResourceLoader;

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub resources: ResourcesConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourcesConfig {
    /// Directory that relative mapping, template and settings paths resolve against
    #[serde(default = "default_resource_root")]
    pub root: PathBuf,
}

fn default_resource_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            root: default_resource_root(),
        }
    }
}

/// Index settings used for entities that do not declare their own
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default = "default_shards")]
    pub default_shards: u32,
    #[serde(default = "default_replicas")]
    pub default_replicas: u32,
    #[serde(default = "default_refresh_interval")]
    pub default_refresh_interval: String,
    #[serde(default = "default_store_type")]
    pub default_store_type: String,
}

fn default_shards() -> u32 {
    1
}

fn default_replicas() -> u32 {
    1
}

fn default_refresh_interval() -> String {
    "1s".to_string()
}

fn default_store_type() -> String {
    "fs".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            default_shards: default_shards(),
            default_replicas: default_replicas(),
            default_refresh_interval: default_refresh_interval(),
            default_store_type: default_store_type(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter string
    /// Override with RUST_LOG env var
    #[serde(default = "default_level")]
    pub level: String,
    /// Log output format: "pretty" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

/// Expand ~ to home directory in path
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
        Ok(home.join(rest))
    } else if s == "~" {
        dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))
    } else {
        Ok(path.to_path_buf())
    }
}

impl Config {
    /// Load config from a file that must exist
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.expand_paths()?;
        Ok(config)
    }

    /// Load config from file path, or create default
    pub fn load_or_create(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            let config = Config::default();
            // Try to save default config
            if let Err(e) = config.save(config_path) {
                tracing::warn!(
                    path = %config_path.display(),
                    error = %e,
                    "could not write default config"
                );
            }
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Expand ~ in all paths
    fn expand_paths(&mut self) -> Result<()> {
        self.resources.root = expand_tilde(&self.resources.root)?;
        Ok(())
    }

    pub fn resource_loader(&self) -> ResourceLoader {
        ResourceLoader::new(&self.resources.root)
    }
}

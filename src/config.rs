// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration for altbot

use crate::classifier::AltSource;
use crate::error::{AltbotError, Result};
use crate::library::DEFAULT_PER_PAGE;
use crate::scanner::DEFAULT_EXTENSIONS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which alt text the save gate trusts
    pub alt_source: AltSource,
    /// Location of the JSON metadata store
    pub store_path: PathBuf,
    /// Dashboard page size
    pub per_page: usize,
    /// Content file extensions picked up by `check`
    pub scan_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alt_source: AltSource::Unified,
            store_path: default_store_path(),
            per_page: DEFAULT_PER_PAGE,
            scan_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("altbot")
}

pub fn default_store_path() -> PathBuf {
    data_dir().join("images.json")
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("altbot")
        .join("config.toml")
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("toml")
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;

    let config: Config = if is_toml(path) {
        toml::from_str(&content)
            .map_err(|e| AltbotError::Config(format!("TOML parse error: {}", e)))?
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| AltbotError::Config(format!("YAML parse error: {}", e)))?
    };

    if config.per_page == 0 {
        return Err(AltbotError::Config("per_page must be at least 1".to_string()));
    }

    Ok(config)
}

pub fn write_default_config(path: &Path) -> Result<()> {
    let config = Config::default();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = if is_toml(path) {
        toml::to_string_pretty(&config)
            .map_err(|e| AltbotError::Config(format!("TOML serialize error: {}", e)))?
    } else {
        serde_yaml::to_string(&config)?
    };

    std::fs::write(path, content)?;
    Ok(())
}

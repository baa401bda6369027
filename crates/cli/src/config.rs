//! Portflow configuration: JSON file, environment overrides, defaults.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::{config_dir, home_dir};
use portflow_api::{API_BASE_ENV_VAR, DEFAULT_API_BASE};
use serde::{Deserialize, Serialize};

/// Environment variable pointing at an alternate config file.
pub const CONFIG_PATH_ENV_VAR: &str = "PORTFLOW_CONFIG_PATH";
/// Environment variable overriding the workflow directory.
pub const WORKFLOWS_DIR_ENV_VAR: &str = "PORTFLOW_WORKFLOWS_DIR";

const DEFAULT_WORKFLOWS_DIR: &str = "workflows";
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5001";

/// Settings read from `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PortflowConfig {
    pub api_base_url: Option<String>,
    pub workflows_dir: Option<String>,
    pub bind_address: Option<String>,
}

/// Returns the default path for the Portflow configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV_VAR)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("portflow").join("config.json")
}

impl PortflowConfig {
    /// Loads the file at [`default_config_path`] and applies environment overrides.
    pub fn load() -> Result<Self> {
        Ok(Self::load_from_path(&default_config_path())?.with_env_overrides())
    }

    /// Loads configuration from `path`; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// `PORT_API_BASE` and `PORTFLOW_WORKFLOWS_DIR` win over file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(base) = non_empty_env(API_BASE_ENV_VAR) {
            self.api_base_url = Some(base);
        }
        if let Some(directory) = non_empty_env(WORKFLOWS_DIR_ENV_VAR) {
            self.workflows_dir = Some(directory);
        }
        self
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn workflows_dir(&self) -> PathBuf {
        expand_tilde(self.workflows_dir.as_deref().unwrap_or(DEFAULT_WORKFLOWS_DIR))
    }

    pub fn bind_address(&self) -> Result<SocketAddr> {
        let raw = self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS);
        raw.parse().with_context(|| format!("invalid bind_address '{raw}'"))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(trimmed)
}

//! Optional settings file for the command line tool.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Values read from `config.json`. Command line flags and environment
/// variables take precedence over everything set here.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_url: Option<String>,
    pub user: Option<String>,
    pub verify_certificates: Option<bool>,
    pub cache: Option<bool>,
    pub cache_ttl_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

impl Settings {
    /// `<config dir>/secrat/config.json`, e.g. `~/.config/secrat/config.json` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("secrat").join("config.json"))
    }

    /// Loads settings from `path`, or from the default location when `path`
    /// is `None`. A missing default file yields empty settings; a missing
    /// explicit file is an error.
    #[tracing::instrument]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            debug!("No settings file at {:?}", path);
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading settings from {:?}", path);
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {:?}", path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file {:?}", path))
    }
}

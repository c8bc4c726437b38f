//! Console settings

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dxp_control::ControllerConfig;
use serde::{Deserialize, Serialize};

/// Persisted console settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Switcher connection
    #[serde(default)]
    pub connection: ControllerConfig,
    /// Print every line sent and received
    #[serde(default)]
    pub show_traffic: bool,
}

impl Settings {
    /// Get the XDG config directory for dxp-control
    /// Uses $XDG_CONFIG_HOME/dxp-control on Linux/macOS, falls back to ~/.config/dxp-control
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("dxp-control"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("dxp-control"))
    }

    /// Default settings file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Save settings to `path`, creating the directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create settings directory")?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        Ok(())
    }
}

/*!
# Settings

User preferences for the download observer and the converter. Stored as
TOML (YAML is accepted on load) and passed explicitly to whatever needs them.

```toml
auto_notify = true
show_notifications = false
include_subdomains = true
whitelist_urls = ["example.com", "data.go.kr"]
```
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "csv-utf8sig";
const SETTINGS_FILE: &str = "settings.toml";

fn default_true() -> bool {
    true
}

/// Persisted user preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Offer conversion when a CSV download completes
    #[serde(default = "default_true")]
    pub auto_notify: bool,

    /// Emit a notification after a successful conversion
    #[serde(default)]
    pub show_notifications: bool,

    /// Origins allowed to trigger an offer; empty allows every origin
    #[serde(default)]
    pub whitelist_urls: Vec<String>,

    /// Whitelist entries also match their subdomains
    #[serde(default = "default_true")]
    pub include_subdomains: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_notify: true,
            show_notifications: false,
            whitelist_urls: Vec::new(),
            include_subdomains: true,
        }
    }
}

/// Partial update; `None` fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_notify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_subdomains: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Settings {
    /// Merge a patch into these settings. Last write wins.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(value) = patch.auto_notify {
            self.auto_notify = value;
        }
        if let Some(value) = patch.show_notifications {
            self.show_notifications = value;
        }
        if let Some(value) = patch.whitelist_urls {
            self.whitelist_urls = value;
        }
        if let Some(value) = patch.include_subdomains {
            self.include_subdomains = value;
        }
    }

    /// Load settings from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read settings from {}", path.as_ref().display())
        })?;

        toml::from_str(&content).with_context(|| {
            format!("Failed to parse TOML settings from {}", path.as_ref().display())
        })
    }

    /// Load settings from a YAML file
    pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read settings from {}", path.as_ref().display())
        })?;

        serde_yaml::from_str(&content).with_context(|| {
            format!("Failed to parse YAML settings from {}", path.as_ref().display())
        })
    }

    /// Load settings, choosing the format by extension. A missing file
    /// yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::load_from_yaml(path),
            _ => Self::load_from_file(path),
        }
    }

    /// Save settings to a TOML file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize settings to TOML")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        tracing::debug!("Settings saved to {}", path.display());
        Ok(())
    }
}

/// Directory holding settings and the recent-download slot
pub fn default_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(base.join(APP_DIR))
}

/// Default settings file location
pub fn default_settings_path() -> Result<PathBuf> {
    Ok(default_config_dir()?.join(SETTINGS_FILE))
}

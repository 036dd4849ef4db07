use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::warn;

pub const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub extract_localized: bool,
    pub add_cheats: bool,
    pub optimize_space: bool,
    pub last_selected_version: Option<String>,
    pub last_folder: Option<String>,
    /// Stamped on every save; a file without a readable stamp is ignored.
    pub launcher_version: String,
    pub last_update_seen: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            extract_localized: false,
            add_cheats: false,
            optimize_space: false,
            last_selected_version: None,
            last_folder: None,
            launcher_version: String::new(),
            last_update_seen: None,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new() -> Result<Self> {
        Ok(Self { path: crate::paths::settings_path()? })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<AppSettings> {
        if !self.path.exists() {
            return Ok(AppSettings::default());
        }
        let text = fs::read_to_string(&self.path)?;
        let settings: AppSettings = match serde_json::from_str(&text) {
            Ok(s) => s,
            Err(e) => {
                warn!("settings file unreadable, falling back to defaults: {e}");
                return Ok(AppSettings::default());
            }
        };
        if settings.launcher_version.is_empty() {
            warn!("settings file has no version stamp, falling back to defaults");
            return Ok(AppSettings::default());
        }
        Ok(settings)
    }

    pub fn save(&self, settings: &AppSettings) -> Result<()> {
        let mut stamped = settings.clone();
        stamped.launcher_version = LAUNCHER_VERSION.to_string();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&stamped)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

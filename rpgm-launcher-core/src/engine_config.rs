use anyhow::Result;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::detect::RgssVersion;
use crate::error::LauncherError;

/// Default mkxp.json option table: name -> (enabled by default, default
/// value). Disabled options are tracked but not written out.
const DEFAULTS: &[(&str, bool)] = &[
    ("rgssVersion", true),
    ("winResizable", true),
    ("smoothScaling", true),
    ("vsync", false),
    ("fullscreen", false),
    ("printFPS", false),
    ("syncToRefreshrate", false),
    ("solidFonts", false),
    ("frameSkip", false),
    ("fixedAspectRatio", false),
    ("defScreenW", false),
    ("defScreenH", false),
    ("midi.soundFont", false),
    ("JITEnabled", false),
];

fn default_value(name: &str) -> Value {
    match name {
        "rgssVersion" => json!(0),
        "defScreenW" => json!(640),
        "defScreenH" => json!(480),
        "midi.soundFont" => json!(""),
        "winResizable" | "smoothScaling" | "fixedAspectRatio" => json!(true),
        _ => json!(false),
    }
}

const FORCED_FILE: &str = "mkxpz-forced.json";
const VALUES_FILE: &str = "mkxpz-values.json";

/// The advanced MKXP-Z configuration: which options are forced into the
/// generated mkxp.json, and what their current values are. Persisted as a
/// pair of JSON documents in the config directory.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    enabled: BTreeMap<String, bool>,
    values: BTreeMap<String, Value>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut enabled = BTreeMap::new();
        let mut values = BTreeMap::new();
        for (name, on) in DEFAULTS {
            enabled.insert((*name).to_string(), *on);
            values.insert((*name).to_string(), default_value(name));
        }
        Self { enabled, values }
    }
}

impl EngineConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&crate::paths::config_dir()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&crate::paths::config_dir()?)
    }

    /// Read the two documents, keeping only known option names; unknown keys
    /// in stale files are dropped silently.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut cfg = Self::default();
        if let Ok(text) = fs::read_to_string(dir.join(FORCED_FILE)) {
            if let Ok(map) = serde_json::from_str::<BTreeMap<String, bool>>(&text) {
                for (k, v) in map {
                    if cfg.enabled.contains_key(&k) {
                        cfg.enabled.insert(k, v);
                    }
                }
            }
        }
        if let Ok(text) = fs::read_to_string(dir.join(VALUES_FILE)) {
            if let Ok(map) = serde_json::from_str::<BTreeMap<String, Value>>(&text) {
                for (k, v) in map {
                    if cfg.values.contains_key(&k) {
                        cfg.values.insert(k, v);
                    }
                }
            }
        }
        Ok(cfg)
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(FORCED_FILE), serde_json::to_string_pretty(&self.enabled)?)?;
        fs::write(dir.join(VALUES_FILE), serde_json::to_string_pretty(&self.values)?)?;
        Ok(())
    }

    pub fn set_enabled(&mut self, name: &str, on: bool) -> Result<()> {
        if !self.enabled.contains_key(name) {
            return Err(LauncherError::UnknownOption(name.to_string()).into());
        }
        self.enabled.insert(name.to_string(), on);
        Ok(())
    }

    pub fn set_value(&mut self, name: &str, value: Value) -> Result<()> {
        if !self.values.contains_key(name) {
            return Err(LauncherError::UnknownOption(name.to_string()).into());
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, bool, &Value)> {
        self.enabled.iter().map(|(name, on)| {
            (name.as_str(), *on, self.values.get(name).unwrap_or(&Value::Null))
        })
    }

    /// Regenerate mkxp.json in the game folder, wholesale, from the enabled
    /// options. `rgssVersion` always reflects what the detector found.
    pub fn write_mkxp_json(&self, game_dir: &Path, rgss: RgssVersion) -> Result<()> {
        let mut doc = serde_json::Map::new();
        for (name, on) in &self.enabled {
            if !*on {
                continue;
            }
            if let Some(v) = self.values.get(name) {
                doc.insert(name.clone(), v.clone());
            }
        }
        doc.insert("rgssVersion".to_string(), json!(rgss.number()));
        let path = game_dir.join("mkxp.json");
        fs::write(&path, serde_json::to_string_pretty(&Value::Object(doc))?)?;
        info!("wrote {} for RGSS{}", path.display(), rgss.number());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_whole_table() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.options().count(), DEFAULTS.len());
        let (name, on, value) = cfg.options().find(|(n, _, _)| *n == "rgssVersion").unwrap();
        assert_eq!(name, "rgssVersion");
        assert!(on);
        assert_eq!(value, &json!(0));
    }

    #[test]
    fn unknown_options_are_rejected() {
        let mut cfg = EngineConfig::default();
        assert!(cfg.set_value("noSuchOption", json!(1)).is_err());
        assert!(cfg.set_enabled("noSuchOption", true).is_err());
        assert!(cfg.set_enabled("vsync", true).is_ok());
    }

    #[test]
    fn pair_of_documents_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = EngineConfig::default();
        cfg.set_enabled("fullscreen", true).unwrap();
        cfg.set_value("fullscreen", json!(true)).unwrap();
        cfg.set_value("defScreenW", json!(800)).unwrap();
        cfg.save_to(dir.path()).unwrap();

        assert!(dir.path().join(FORCED_FILE).is_file());
        assert!(dir.path().join(VALUES_FILE).is_file());

        let loaded = EngineConfig::load_from(dir.path()).unwrap();
        let (_, on, value) = loaded.options().find(|(n, _, _)| *n == "fullscreen").unwrap();
        assert!(on);
        assert_eq!(value, &json!(true));
    }

    #[test]
    fn stale_keys_are_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(FORCED_FILE), r#"{"removedOption": true, "vsync": true}"#)
            .unwrap();
        let loaded = EngineConfig::load_from(dir.path()).unwrap();
        assert!(loaded.options().all(|(n, _, _)| n != "removedOption"));
        let (_, on, _) = loaded.options().find(|(n, _, _)| *n == "vsync").unwrap();
        assert!(on);
    }

    #[test]
    fn mkxp_json_is_regenerated_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mkxp.json"), r#"{"stale": true}"#).unwrap();

        let cfg = EngineConfig::default();
        cfg.write_mkxp_json(dir.path(), RgssVersion::Rgss3).unwrap();

        let doc: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("mkxp.json")).unwrap())
                .unwrap();
        assert_eq!(doc["rgssVersion"], json!(3));
        assert_eq!(doc["winResizable"], json!(true));
        assert!(doc.get("stale").is_none());
        // disabled options stay out of the generated file
        assert!(doc.get("fullscreen").is_none());
    }
}

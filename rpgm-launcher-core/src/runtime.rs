use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::error::LauncherError;

/// The three runtime families the launcher manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Nwjs,
    MkxpZ,
    EasyRpg,
}

impl Runtime {
    pub fn label(&self) -> &'static str {
        match self {
            Runtime::Nwjs => "NWJS",
            Runtime::MkxpZ => "MKXP-Z",
            Runtime::EasyRpg => "EasyRPG",
        }
    }

    /// Directory name for an installed build. The prefix encodes the family:
    /// `v*` NWJS, `mkxpz-*` MKXP-Z, `easyrpg-*` EasyRPG.
    pub fn dir_name(&self, version: &str) -> String {
        match self {
            Runtime::Nwjs => {
                if version.starts_with('v') {
                    version.to_string()
                } else {
                    format!("v{version}")
                }
            }
            Runtime::MkxpZ => format!("mkxpz-{version}"),
            Runtime::EasyRpg => format!("easyrpg-{version}"),
        }
    }

    pub fn parse_dir_name(name: &str) -> Option<(Runtime, &str)> {
        if let Some(v) = name.strip_prefix("mkxpz-") {
            return Some((Runtime::MkxpZ, v));
        }
        if let Some(v) = name.strip_prefix("easyrpg-") {
            return Some((Runtime::EasyRpg, v));
        }
        let rest = name.strip_prefix('v')?;
        if rest.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Some((Runtime::Nwjs, rest));
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct InstalledVersion {
    pub runtime: Runtime,
    /// Directory name, e.g. `v0.84.0` or `mkxpz-v2.4.2`.
    pub name: String,
    pub path: PathBuf,
}

/// Scan the versions directory. Anything whose name doesn't parse is left
/// alone (staging leftovers, user clutter).
pub fn installed_versions(filter: Option<Runtime>) -> Result<Vec<InstalledVersion>> {
    let root = crate::paths::versions_dir()?;
    let mut out = Vec::new();
    for entry in fs::read_dir(&root)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some((runtime, _)) = Runtime::parse_dir_name(&name) {
            if filter.map_or(true, |f| f == runtime) {
                out.push(InstalledVersion { runtime, name, path: entry.path() });
            }
        }
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

pub fn find_installed(name: &str) -> Result<InstalledVersion> {
    let path = crate::paths::version_dir(name)?;
    let (runtime, _) = Runtime::parse_dir_name(name)
        .filter(|_| path.is_dir())
        .ok_or_else(|| LauncherError::VersionNotInstalled(name.to_string()))?;
    Ok(InstalledVersion { runtime, name: name.to_string(), path })
}

pub fn uninstall(name: &str) -> Result<()> {
    let version = find_installed(name)?;
    fs::remove_dir_all(&version.path)?;
    info!("removed {}", version.path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_names_roundtrip() {
        assert_eq!(Runtime::Nwjs.dir_name("0.84.0"), "v0.84.0");
        assert_eq!(Runtime::Nwjs.dir_name("v0.84.0"), "v0.84.0");
        assert_eq!(Runtime::MkxpZ.dir_name("v2.4.2"), "mkxpz-v2.4.2");
        assert_eq!(Runtime::EasyRpg.dir_name("0.8.1"), "easyrpg-0.8.1");

        assert_eq!(Runtime::parse_dir_name("v0.84.0"), Some((Runtime::Nwjs, "0.84.0")));
        assert_eq!(Runtime::parse_dir_name("mkxpz-v2.4.2"), Some((Runtime::MkxpZ, "v2.4.2")));
        assert_eq!(Runtime::parse_dir_name("easyrpg-0.8.1"), Some((Runtime::EasyRpg, "0.8.1")));
    }

    #[test]
    fn non_version_names_are_ignored() {
        assert_eq!(Runtime::parse_dir_name("videos"), None);
        assert_eq!(Runtime::parse_dir_name("v"), None);
        assert_eq!(Runtime::parse_dir_name(".staging-v0.84.0"), None);
        assert_eq!(Runtime::parse_dir_name("logs"), None);
    }
}

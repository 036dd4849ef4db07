use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::download::{download_with_progress, extract_zip};
use crate::error::LauncherError;
use crate::github::USER_AGENT;
use crate::runtime::Runtime;

pub const VERSIONS_URL: &str = "https://nwjs.io/versions";
/// Marker file inside a version directory: launch this build through
/// Rosetta 2 (`arch -x86_64`).
pub const ROSETTA_MARKER: &str = "run-with-rosetta";

#[derive(Debug, Clone, Deserialize)]
pub struct NwjsManifest {
    pub latest: Option<String>,
    pub stable: Option<String>,
    pub versions: Vec<NwjsVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NwjsVersion {
    /// Tag with the leading `v`, e.g. `v0.84.0`.
    pub version: String,
    pub date: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

impl NwjsVersion {
    pub fn supports(&self, platform: &str) -> bool {
        self.files.iter().any(|f| f == platform)
    }
}

impl NwjsManifest {
    pub fn find(&self, version: &str) -> Option<&NwjsVersion> {
        let tagged = if version.starts_with('v') { version.to_string() } else { format!("v{version}") };
        self.versions.iter().find(|v| v.version == tagged)
    }
}

pub fn host_arch() -> &'static str {
    if cfg!(target_arch = "aarch64") { "arm64" } else { "x64" }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchChoice {
    Native(&'static str),
    /// No arm64 build exists for this version; the x64 build can run under
    /// Rosetta 2 if the caller opts in.
    NeedsRosetta,
}

pub fn choose_arch(info: &NwjsVersion) -> ArchChoice {
    choose_arch_for(info, host_arch())
}

fn choose_arch_for(info: &NwjsVersion, arch: &'static str) -> ArchChoice {
    if arch == "arm64" && !info.supports("osx-arm64") {
        ArchChoice::NeedsRosetta
    } else {
        ArchChoice::Native(arch)
    }
}

pub fn download_url(version: &str, arch: &str) -> String {
    format!("https://dl.nwjs.io/{version}/nwjs-sdk-{version}-osx-{arch}.zip")
}

pub async fn fetch_versions() -> Result<NwjsManifest> {
    info!("querying available NWJS versions");
    let client = reqwest::Client::new();
    let manifest = client
        .get(VERSIONS_URL)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .json::<NwjsManifest>()
        .await?;
    Ok(manifest)
}

/// Download and install one NWJS build. Reinstalling a version replaces its
/// directory wholesale.
pub async fn install(
    info: &NwjsVersion,
    use_rosetta: bool,
    mut progress: impl FnMut(&str, u8),
) -> Result<PathBuf> {
    let mut progress_cb = |m: &str, pct: u8| { info!("{}", m); progress(m, pct); };
    let version = info.version.as_str();
    let arch = if use_rosetta {
        "x64"
    } else {
        match choose_arch(info) {
            ArchChoice::Native(a) => a,
            ArchChoice::NeedsRosetta => {
                return Err(LauncherError::UnsupportedArch(version.to_string()).into())
            }
        }
    };

    progress_cb(&format!("Downloading NWJS {version} ({arch})"), 5);
    let data = download_with_progress(&download_url(version, arch), 5, 60, |m, p| progress_cb(m, p)).await?;

    progress_cb("Extracting archive", 60);
    let staging = crate::paths::versions_dir()?.join(format!(".staging-{version}"));
    let _ = fs::remove_dir_all(&staging);
    extract_zip(&data, &staging, 60, 90, |m, p| progress_cb(m, p))?;

    progress_cb("Installing", 92);
    let dest = crate::paths::version_dir(&Runtime::Nwjs.dir_name(version))?;
    if dest.exists() {
        fs::remove_dir_all(&dest)?;
    }
    fs::create_dir_all(&dest)?;

    // The archive wraps nwjs.app in nwjs-sdk-<ver>-osx-<arch>/.
    let wrapped = staging.join(format!("nwjs-sdk-{version}-osx-{arch}")).join("nwjs.app");
    let app_src = if wrapped.exists() { wrapped } else { staging.join("nwjs.app") };
    if !app_src.exists() {
        anyhow::bail!("archive for {version} did not contain nwjs.app");
    }
    if fs::rename(&app_src, dest.join("nwjs.app")).is_err() {
        let mut opts = fs_extra::dir::CopyOptions::new();
        opts.overwrite = true;
        fs_extra::dir::copy(&app_src, &dest, &opts)?;
    }

    if use_rosetta {
        fs::write(dest.join(ROSETTA_MARKER), "This build runs under Rosetta 2.\n")?;
    }
    let _ = fs::remove_dir_all(&staging);
    progress_cb(&format!("NWJS {version} installed"), 100);
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "latest": "v0.84.0",
        "stable": "v0.82.0",
        "versions": [
            {"version": "v0.84.0", "date": "2024-01-20", "files": ["linux-x64", "osx-arm64", "osx-x64", "win-x64"]},
            {"version": "v0.48.0", "date": "2020-08-26", "files": ["linux-x64", "osx-x64", "win-x64"]}
        ]
    }"#;

    #[test]
    fn manifest_parses() {
        let m: NwjsManifest = serde_json::from_str(MANIFEST).unwrap();
        assert_eq!(m.latest.as_deref(), Some("v0.84.0"));
        assert_eq!(m.versions.len(), 2);
        assert!(m.versions[0].supports("osx-arm64"));
        assert!(!m.versions[1].supports("osx-arm64"));
    }

    #[test]
    fn find_tolerates_missing_v_prefix() {
        let m: NwjsManifest = serde_json::from_str(MANIFEST).unwrap();
        assert!(m.find("0.84.0").is_some());
        assert!(m.find("v0.48.0").is_some());
        assert!(m.find("v9.99.0").is_none());
    }

    #[test]
    fn arch_choice_on_apple_silicon() {
        let m: NwjsManifest = serde_json::from_str(MANIFEST).unwrap();
        assert_eq!(choose_arch_for(&m.versions[0], "arm64"), ArchChoice::Native("arm64"));
        assert_eq!(choose_arch_for(&m.versions[1], "arm64"), ArchChoice::NeedsRosetta);
        assert_eq!(choose_arch_for(&m.versions[1], "x64"), ArchChoice::Native("x64"));
    }

    #[test]
    fn download_url_shape() {
        assert_eq!(
            download_url("v0.84.0", "arm64"),
            "https://dl.nwjs.io/v0.84.0/nwjs-sdk-v0.84.0-osx-arm64.zip"
        );
    }
}

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::download::{download_with_progress, extract_zip, flatten_single_dir};
use crate::github::{GitHubAsset, GitHubRelease};
use crate::runtime::Runtime;

pub const GITHUB_OWNER: &str = "mkxp-z";
pub const GITHUB_REPO: &str = "mkxp-z";
/// Name of the app bundle inside an installed version directory.
pub const APP_BUNDLE: &str = "Z-universal.app";

/// Pick the macOS player archive; release pages also carry Windows/Linux
/// builds and source tarballs.
pub fn select_macos_asset(release: &GitHubRelease) -> Option<&GitHubAsset> {
    let zips = || release.assets.iter().filter(|a| a.name.to_ascii_lowercase().ends_with(".zip"));
    zips()
        .find(|a| {
            let n = a.name.to_ascii_lowercase();
            n.contains("macos") || n.contains("osx") || n.contains("universal")
        })
        .or_else(|| zips().find(|a| !a.name.to_ascii_lowercase().contains("source")))
}

pub async fn install(release: &GitHubRelease, mut progress: impl FnMut(&str, u8)) -> Result<PathBuf> {
    let mut progress_cb = |m: &str, pct: u8| { info!("{}", m); progress(m, pct); };
    let tag = release.tag_name.clone().ok_or_else(|| anyhow::anyhow!("release has no tag"))?;
    let asset = select_macos_asset(release).ok_or_else(|| anyhow::anyhow!("no suitable asset"))?;
    let url = asset.browser_download_url.clone().ok_or_else(|| anyhow::anyhow!("asset has no download url"))?;

    progress_cb(&format!("Downloading {}", asset.name), 5);
    let data = download_with_progress(&url, 5, 60, |m, p| progress_cb(m, p)).await?;

    let dest = crate::paths::version_dir(&Runtime::MkxpZ.dir_name(&tag))?;
    if dest.exists() {
        fs::remove_dir_all(&dest)?;
    }
    progress_cb("Extracting archive", 62);
    extract_zip(&data, &dest, 62, 95, |m, p| progress_cb(m, p))?;
    flatten_single_dir(&dest)?;

    progress_cb(&format!("MKXP-Z {tag} installed"), 100);
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(assets: &[&str]) -> GitHubRelease {
        GitHubRelease {
            tag_name: Some("v2.4.2".into()),
            assets: assets
                .iter()
                .map(|n| GitHubAsset {
                    name: n.to_string(),
                    browser_download_url: Some(format!("https://example.invalid/{n}")),
                    size: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn prefers_macos_archive() {
        let r = release(&["mkxp-z_Windows.zip", "mkxp-z_macOS.zip", "mkxp-z_Linux.tar.gz"]);
        assert_eq!(select_macos_asset(&r).unwrap().name, "mkxp-z_macOS.zip");
    }

    #[test]
    fn falls_back_to_any_non_source_zip() {
        let r = release(&["source.zip", "player-build.zip"]);
        assert_eq!(select_macos_asset(&r).unwrap().name, "player-build.zip");
    }

    #[test]
    fn no_zip_means_no_asset() {
        let r = release(&["player.tar.gz"]);
        assert!(select_macos_asset(&r).is_none());
    }
}

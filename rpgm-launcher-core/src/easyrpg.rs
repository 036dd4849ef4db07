use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::download::{download_with_progress, extract_zip, flatten_single_dir};
use crate::github::{GitHubAsset, GitHubRelease};
use crate::runtime::Runtime;

pub const GITHUB_OWNER: &str = "EasyRPG";
pub const GITHUB_REPO: &str = "Player";
pub const APP_BUNDLE: &str = "EasyRPG Player.app";

pub fn select_macos_asset(release: &GitHubRelease) -> Option<&GitHubAsset> {
    let zips = || release.assets.iter().filter(|a| a.name.to_ascii_lowercase().ends_with(".zip"));
    zips()
        .find(|a| {
            let n = a.name.to_ascii_lowercase();
            n.contains("macos") || n.contains("osx")
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

    let dest = crate::paths::version_dir(&Runtime::EasyRpg.dir_name(&tag))?;
    if dest.exists() {
        fs::remove_dir_all(&dest)?;
    }
    progress_cb("Extracting archive", 62);
    extract_zip(&data, &dest, 62, 95, |m, p| progress_cb(m, p))?;
    flatten_single_dir(&dest)?;

    progress_cb(&format!("EasyRPG Player {tag} installed"), 100);
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_macos_archive() {
        let r = GitHubRelease {
            tag_name: Some("0.8.1".into()),
            assets: vec![
                GitHubAsset { name: "easyrpg-player-0.8.1-windows.zip".into(), ..Default::default() },
                GitHubAsset { name: "easyrpg-player-0.8.1-macos.zip".into(), ..Default::default() },
            ],
            ..Default::default()
        };
        assert_eq!(
            select_macos_asset(&r).unwrap().name,
            "easyrpg-player-0.8.1-macos.zip"
        );
    }
}

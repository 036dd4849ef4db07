use anyhow::Result;
use tracing::info;

use crate::github::{fetch_releases, GitHubRateLimit};
use crate::settings::{AppSettings, LAUNCHER_VERSION};

pub const LAUNCHER_OWNER: &str = "m5kro";
pub const LAUNCHER_REPO: &str = "rpgm-launcher";

#[derive(Debug, Clone)]
pub struct UpdateNotice {
    pub tag: String,
    pub name: Option<String>,
    pub url: String,
}

/// Check the launcher's own releases. Returns a notice at most once per new
/// tag; the caller persists `last_update_seen` after showing it.
pub async fn check_for_update(settings: &AppSettings) -> Result<Option<UpdateNotice>> {
    let mut rate_limit = GitHubRateLimit::default();
    let releases = fetch_releases(LAUNCHER_OWNER, LAUNCHER_REPO, &mut rate_limit).await?;
    let Some(latest) = releases.iter().find(|r| !r.prerelease && r.tag_name.is_some()) else {
        return Ok(None);
    };
    let tag = latest.tag_name.clone().unwrap_or_default();
    if !is_new_tag(&tag, LAUNCHER_VERSION, settings.last_update_seen.as_deref()) {
        info!("no new launcher release (latest {tag})");
        return Ok(None);
    }
    Ok(Some(UpdateNotice {
        tag: tag.clone(),
        name: latest.name.clone(),
        url: format!("https://github.com/{LAUNCHER_OWNER}/{LAUNCHER_REPO}/releases/tag/{tag}"),
    }))
}

fn is_new_tag(tag: &str, current_version: &str, last_seen: Option<&str>) -> bool {
    let bare = tag.trim_start_matches('v');
    if bare == current_version.trim_start_matches('v') {
        return false;
    }
    last_seen != Some(tag)
}

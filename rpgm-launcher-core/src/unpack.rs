use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;
use walkdir::WalkDir;

use crate::error::LauncherError;

/// Localized rereleases often ship their English assets inside a
/// `game_en.exe` Enigma Virtual Box self-extractor. Unpack it with the
/// external `evbunpack` tool, merge the tree over the game folder, and drop
/// the packer leftovers.
///
/// Returns false when the folder has no `game_en.exe` (nothing to do).
pub fn extract_localized_assets(game_dir: &Path) -> Result<bool> {
    let Some(exe) = find_game_en(game_dir) else {
        info!("no game_en.exe under {}", game_dir.display());
        return Ok(false);
    };
    let tool = which::which("evbunpack").map_err(|_| LauncherError::MissingTool("evbunpack"))?;

    let staging = game_dir.join("extracted");
    let _ = fs::remove_dir_all(&staging);
    let status = Command::new(&tool)
        .arg(&exe)
        .arg(&staging)
        .status()
        .with_context(|| format!("run {}", tool.display()))?;
    if !status.success() {
        anyhow::bail!("evbunpack exited with {status} for {}", exe.display());
    }

    let mut opts = fs_extra::dir::CopyOptions::new();
    opts.content_only = true;
    opts.overwrite = true;
    fs_extra::dir::copy(&staging, game_dir, &opts).context("merge unpacked assets")?;

    fs::remove_file(&exe)?;
    fs::remove_dir_all(&staging)?;
    info!("unpacked {} and removed the self-extractor", exe.display());
    Ok(true)
}

fn find_game_en(root: &Path) -> Option<PathBuf> {
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file()
            && entry.file_name().to_string_lossy().eq_ignore_ascii_case("game_en.exe")
        {
            return Some(entry.path().to_path_buf());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_game_en() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("www").join("bin");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("Game_EN.exe"), b"").unwrap();
        assert_eq!(find_game_en(dir.path()), Some(nested.join("Game_EN.exe")));
    }

    #[test]
    fn absent_exe_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Game.exe"), b"").unwrap();
        assert!(find_game_en(dir.path()).is_none());
        assert!(!extract_localized_assets(dir.path()).unwrap());
    }
}

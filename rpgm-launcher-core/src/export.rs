use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use crate::detect::DetectedGame;
use crate::error::LauncherError;
use crate::jobs::CancelFlag;
use crate::logging::ProgressThrottle;
use crate::runtime::{InstalledVersion, Runtime};

/// Copy a runtime bundle plus the (already patched) game folder into a new,
/// self-contained application directory.
///
/// NWJS exports become `<dest>/<name>.app` with the game embedded at
/// `Contents/Resources/app.nw`; MKXP-Z and EasyRPG exports become a folder
/// holding the player bundle next to a `game/` directory, the same layout
/// the launcher itself uses.
///
/// The copy runs file by file; `cancel` is polled between files and aborts
/// with `LauncherError::Cancelled`, leaving whatever was already copied.
pub fn export_standalone(
    version: &InstalledVersion,
    game: &DetectedGame,
    dest_dir: &Path,
    app_name: &str,
    cancel: &CancelFlag,
    mut progress: impl FnMut(&str, u8),
) -> Result<PathBuf> {
    let required = game.kind.runtime();
    if version.runtime != required {
        return Err(LauncherError::RuntimeMismatch {
            version: version.name.clone(),
            selected: version.runtime.label(),
            required: required.label(),
        }
        .into());
    }

    progress("Planning export", 2);
    let mut copies: Vec<(PathBuf, PathBuf)> = Vec::new();
    let out_root = match version.runtime {
        Runtime::Nwjs => dest_dir.join(format!("{app_name}.app")),
        Runtime::MkxpZ | Runtime::EasyRpg => dest_dir.join(app_name),
    };
    if out_root.exists() {
        anyhow::bail!("{} already exists", out_root.display());
    }

    match version.runtime {
        Runtime::Nwjs => {
            collect_copies(&version.path.join("nwjs.app"), &out_root, &mut copies)?;
            let app_nw = out_root.join("Contents").join("Resources").join("app.nw");
            collect_copies(&game.folder, &app_nw, &mut copies)?;
        }
        Runtime::MkxpZ => {
            let bundle = crate::mkxpz::APP_BUNDLE;
            collect_copies(&version.path.join(bundle), &out_root.join(bundle), &mut copies)?;
            collect_copies(&game.folder, &out_root.join("game"), &mut copies)?;
        }
        Runtime::EasyRpg => {
            let bundle = crate::easyrpg::APP_BUNDLE;
            collect_copies(&version.path.join(bundle), &out_root.join(bundle), &mut copies)?;
            collect_copies(&game.folder, &out_root.join("game"), &mut copies)?;
        }
    }

    info!("exporting {} files to {}", copies.len(), out_root.display());
    let mut throttle = ProgressThrottle::new(150);
    let total = copies.len().max(1);
    for (i, (src, dst)) in copies.iter().enumerate() {
        if cancel.is_cancelled() {
            info!("export cancelled, partial output left at {}", out_root.display());
            return Err(LauncherError::Cancelled.into());
        }
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst).with_context(|| format!("copy {}", src.display()))?;
        let pct = 5 + ((i as f32 / total as f32) * 93.0) as u8;
        let name = src.file_name().and_then(|n| n.to_str()).unwrap_or("...");
        throttle.emit("Copying", format!("Copying {name}"), pct.min(98), |m, p| progress(m, p));
    }

    progress("Export complete", 100);
    info!("export complete: {}", out_root.display());
    Ok(out_root)
}

// Directories are created eagerly so empty ones survive; files are queued for
// the cancellable loop.
fn collect_copies(src_root: &Path, dst_root: &Path, out: &mut Vec<(PathBuf, PathBuf)>) -> Result<()> {
    if !src_root.exists() {
        return Err(LauncherError::MissingFile(src_root.to_path_buf()).into());
    }
    for entry in WalkDir::new(src_root) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src_root)?;
        let dst = dst_root.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dst)?;
        } else {
            out.push((entry.path().to_path_buf(), dst));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::GameKind;

    fn fake_nwjs_version(root: &Path) -> InstalledVersion {
        let bin = root.join("v0.84.0").join("nwjs.app").join("Contents").join("MacOS");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("nwjs"), b"#!binary").unwrap();
        InstalledVersion {
            runtime: Runtime::Nwjs,
            name: "v0.84.0".into(),
            path: root.join("v0.84.0"),
        }
    }

    fn fake_game(root: &Path) -> DetectedGame {
        let www = root.join("game").join("www");
        fs::create_dir_all(&www).unwrap();
        fs::write(root.join("game").join("package.json"), b"{}").unwrap();
        fs::write(www.join("index.html"), b"<html>").unwrap();
        DetectedGame { folder: root.join("game"), kind: GameKind::MvMz }
    }

    #[test]
    fn nwjs_export_embeds_the_game() {
        let dir = tempfile::tempdir().unwrap();
        let version = fake_nwjs_version(dir.path());
        let game = fake_game(dir.path());
        let dest = dir.path().join("out");
        fs::create_dir_all(&dest).unwrap();

        let out = export_standalone(
            &version,
            &game,
            &dest,
            "My Game",
            &CancelFlag::new(),
            |_m, _p| {},
        )
        .unwrap();

        assert_eq!(out, dest.join("My Game.app"));
        assert!(out.join("Contents").join("MacOS").join("nwjs").is_file());
        let app_nw = out.join("Contents").join("Resources").join("app.nw");
        assert!(app_nw.join("package.json").is_file());
        assert!(app_nw.join("www").join("index.html").is_file());
    }

    #[test]
    fn cancelled_export_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let version = fake_nwjs_version(dir.path());
        let game = fake_game(dir.path());
        let dest = dir.path().join("out");
        fs::create_dir_all(&dest).unwrap();

        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = export_standalone(&version, &game, &dest, "My Game", &cancel, |_m, _p| {})
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LauncherError>(),
            Some(LauncherError::Cancelled)
        ));
        assert!(!dest.join("My Game.app").join("Contents").join("MacOS").join("nwjs").exists());
    }

    #[test]
    fn existing_destination_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let version = fake_nwjs_version(dir.path());
        let game = fake_game(dir.path());
        let dest = dir.path().join("out");
        fs::create_dir_all(dest.join("My Game.app")).unwrap();

        assert!(export_standalone(&version, &game, &dest, "My Game", &CancelFlag::new(), |_m, _p| {})
            .is_err());
    }
}

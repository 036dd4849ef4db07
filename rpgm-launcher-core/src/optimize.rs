use anyhow::Result;
use humansize::{format_size, DECIMAL};
use std::fs;
use std::path::Path;
use tracing::info;
use walkdir::WalkDir;

use crate::detect::GameKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeReport {
    pub removed: usize,
    pub bytes: u64,
}

impl OptimizeReport {
    pub fn human_bytes(&self) -> String {
        format_size(self.bytes, DECIMAL)
    }
}

/// Delete the Windows-only payload from a game folder. The runtimes we launch
/// with bring their own engine binaries, so the shipped ones are dead weight.
/// Only call this after detection: the detector may need the DLL names.
pub fn optimize_space(game_dir: &Path, kind: &GameKind) -> Result<OptimizeReport> {
    let (files, exts, dirs): (&[&str], &[&str], &[&str]) = match kind {
        GameKind::MvMz => (
            &["Game.exe", "nw.pak", "icudtl.dat", "natives_blob.bin", "snapshot_blob.bin"],
            &["dll"],
            &["locales", "swiftshader", "pnacl"],
        ),
        GameKind::Rgss { .. } => (&["Game.exe"], &["dll"], &[]),
        GameKind::Rpg2k => (&["RPG_RT.exe"], &["dll"], &[]),
    };

    let mut report = OptimizeReport::default();
    for entry in fs::read_dir(game_dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if path.is_dir() {
            if dirs.iter().any(|d| d.eq_ignore_ascii_case(&name)) {
                report.bytes += dir_size(&path);
                report.removed += 1;
                fs::remove_dir_all(&path)?;
            }
            continue;
        }
        let by_name = files.iter().any(|f| f.eq_ignore_ascii_case(&name));
        let by_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if by_name || by_ext {
            report.bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            report.removed += 1;
            fs::remove_file(&path)?;
        }
    }

    info!(
        "space optimization removed {} entries ({}) from {}",
        report.removed,
        report.human_bytes(),
        game_dir.display()
    );
    Ok(report)
}

fn dir_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mv_payload_is_removed_and_assets_kept() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Game.exe"), vec![0u8; 100]).unwrap();
        fs::write(dir.path().join("nw.pak"), vec![0u8; 50]).unwrap();
        fs::write(dir.path().join("ffmpeg.dll"), vec![0u8; 25]).unwrap();
        fs::create_dir_all(dir.path().join("locales")).unwrap();
        fs::write(dir.path().join("locales").join("en-US.pak"), vec![0u8; 10]).unwrap();
        fs::create_dir_all(dir.path().join("www")).unwrap();
        fs::write(dir.path().join("www").join("index.html"), b"<html>").unwrap();
        fs::write(dir.path().join("package.json"), b"{}").unwrap();

        let report = optimize_space(dir.path(), &GameKind::MvMz).unwrap();
        assert_eq!(report.removed, 4);
        assert_eq!(report.bytes, 185);
        assert!(!dir.path().join("Game.exe").exists());
        assert!(!dir.path().join("locales").exists());
        assert!(dir.path().join("www").join("index.html").exists());
        assert!(dir.path().join("package.json").exists());
    }

    #[test]
    fn rgss_dlls_go_but_data_stays() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Game.exe"), b"x").unwrap();
        fs::write(dir.path().join("RGSS301.dll"), b"x").unwrap();
        fs::write(dir.path().join("Game.rgss3a"), b"x").unwrap();
        fs::write(dir.path().join("Game.ini"), b"[Game]").unwrap();

        let kind = GameKind::Rgss { version: crate::detect::RgssVersion::Rgss3, rtp: None };
        let report = optimize_space(dir.path(), &kind).unwrap();
        assert_eq!(report.removed, 2);
        assert!(dir.path().join("Game.rgss3a").exists());
        assert!(dir.path().join("Game.ini").exists());
    }

    #[test]
    fn rpg2k_runtime_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("RPG_RT.exe"), b"x").unwrap();
        fs::write(dir.path().join("RPG_RT.ldb"), b"x").unwrap();
        fs::write(dir.path().join("ultimate_rt_eb.dll"), b"x").unwrap();

        let report = optimize_space(dir.path(), &GameKind::Rpg2k).unwrap();
        assert_eq!(report.removed, 2);
        assert!(dir.path().join("RPG_RT.ldb").exists());
    }
}

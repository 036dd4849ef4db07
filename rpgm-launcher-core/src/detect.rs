use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::LauncherError;
use crate::runtime::Runtime;

/// RGSS ABI major version, the thing MKXP-Z needs to know up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RgssVersion {
    Rgss1,
    Rgss2,
    Rgss3,
}

impl RgssVersion {
    pub fn number(self) -> u8 {
        match self {
            RgssVersion::Rgss1 => 1,
            RgssVersion::Rgss2 => 2,
            RgssVersion::Rgss3 => 3,
        }
    }

    /// Canonical RTP package name for this ABI.
    pub fn rtp_name(self) -> &'static str {
        match self {
            RgssVersion::Rgss1 => "Standard",
            RgssVersion::Rgss2 => "RPGVX",
            RgssVersion::Rgss3 => "RPGVXAce",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameKind {
    /// RPG Maker MV/MZ: a web app with a package.json manifest.
    MvMz,
    /// RPG Maker XP/VX/VX Ace: Game.ini plus an RGSS scripting DLL.
    Rgss { version: RgssVersion, rtp: Option<String> },
    /// RPG Maker 2000/2003: RPG_RT runtime files.
    Rpg2k,
}

impl GameKind {
    pub fn runtime(&self) -> Runtime {
        match self {
            GameKind::MvMz => Runtime::Nwjs,
            GameKind::Rgss { .. } => Runtime::MkxpZ,
            GameKind::Rpg2k => Runtime::EasyRpg,
        }
    }

    pub fn label(&self) -> String {
        match self {
            GameKind::MvMz => "RPG Maker MV/MZ".to_string(),
            GameKind::Rgss { version, .. } => {
                format!("RPG Maker XP/VX/VX Ace (RGSS{})", version.number())
            }
            GameKind::Rpg2k => "RPG Maker 2000/2003".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectedGame {
    pub folder: PathBuf,
    pub kind: GameKind,
}

// RGSS104E.dll, RGSS202E.dll, RGSS301.dll, RGSS102J.dll, ...
static RGSS_DLL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^rgss([123])\d*[a-z]?\.dll$").unwrap());

/// Classify a folder by its marker files. Recomputed on every selection,
/// never persisted.
pub fn detect_game(folder: &Path) -> Result<DetectedGame> {
    if !folder.is_dir() {
        return Err(LauncherError::NotAGame(folder.to_path_buf()).into());
    }

    if folder.join("package.json").is_file() {
        info!("{}: RPG Maker MV/MZ (package.json)", folder.display());
        return Ok(DetectedGame { folder: folder.to_path_buf(), kind: GameKind::MvMz });
    }

    let ini = folder.join("Game.ini");
    if ini.is_file() {
        let (version, rtp) = rgss_heuristics(folder, &ini)?;
        info!("{}: RGSS{} game (Game.ini)", folder.display(), version.number());
        return Ok(DetectedGame {
            folder: folder.to_path_buf(),
            kind: GameKind::Rgss { version, rtp },
        });
    }

    for marker in ["RPG_RT.ldb", "RPG_RT.ini", "RPG_RT.exe"] {
        if folder.join(marker).is_file() {
            info!("{}: RPG Maker 2000/2003 ({marker})", folder.display());
            return Ok(DetectedGame { folder: folder.to_path_buf(), kind: GameKind::Rpg2k });
        }
    }

    Err(LauncherError::NotAGame(folder.to_path_buf()).into())
}

// Game.ini ships in whatever codepage the original editor used; the keys we
// care about are plain ASCII, so a lossy decode is fine.
fn read_ini_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Determine the RGSS ABI version: the `RTP=` value is authoritative, then
/// the `Library=` DLL name, then any `RGSS*.dll` sitting in the folder.
fn rgss_heuristics(folder: &Path, ini: &Path) -> Result<(RgssVersion, Option<String>)> {
    let text = read_ini_lossy(ini)?;
    let mut library_dll: Option<String> = None;
    let mut rtp: Option<String> = None;
    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else { continue };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().trim_matches('"');
        if value.is_empty() {
            continue;
        }
        if key == "library" {
            // value may be a path like System\RGSS301.dll
            let file = value.rsplit(['\\', '/']).next().unwrap_or(value);
            library_dll = Some(file.to_string());
        } else if key == "rtp" || (key.starts_with("rtp") && key[3..].chars().all(|c| c.is_ascii_digit())) {
            if rtp.is_none() {
                rtp = Some(value.to_string());
            }
        }
    }

    if let Some(name) = rtp.as_deref() {
        if let Some(v) = rtp_to_version(name) {
            return Ok((v, rtp));
        }
    }
    if let Some(dll) = library_dll.as_deref() {
        if let Some(v) = dll_to_version(dll) {
            return Ok((v, rtp));
        }
    }
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(v) = dll_to_version(&name) {
            return Ok((v, rtp));
        }
    }

    warn!("could not determine RGSS version for {}, assuming RGSS1", folder.display());
    Ok((RgssVersion::Rgss1, rtp))
}

fn rtp_to_version(name: &str) -> Option<RgssVersion> {
    match name.to_ascii_lowercase().as_str() {
        "standard" | "rpgxp" => Some(RgssVersion::Rgss1),
        "rpgvx" => Some(RgssVersion::Rgss2),
        "rpgvxace" => Some(RgssVersion::Rgss3),
        _ => None,
    }
}

fn dll_to_version(file_name: &str) -> Option<RgssVersion> {
    let caps = RGSS_DLL.captures(file_name)?;
    match &caps[1] {
        "1" => Some(RgssVersion::Rgss1),
        "2" => Some(RgssVersion::Rgss2),
        "3" => Some(RgssVersion::Rgss3),
        _ => None,
    }
}

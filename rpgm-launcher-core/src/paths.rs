use anyhow::Result;
use directories::ProjectDirs;
use std::{fs, path::PathBuf};

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("io.github", "m5kro", "rpgm-launcher")
        .ok_or_else(|| anyhow::anyhow!("project dirs"))
}

pub fn data_dir() -> Result<PathBuf> {
    let dir = project_dirs()?.data_dir().to_path_buf();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn config_dir() -> Result<PathBuf> {
    let dir = project_dirs()?.config_dir().to_path_buf();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn cache_dir() -> Result<PathBuf> {
    let dir = project_dirs()?.cache_dir().to_path_buf();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// One subdirectory per installed runtime build lives under here. The
/// directory name is both the identifier and the location; there is no
/// separate manifest.
pub fn versions_dir() -> Result<PathBuf> {
    let dir = data_dir()?.join("versions");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn version_dir(name: &str) -> Result<PathBuf> {
    Ok(versions_dir()?.join(name))
}

pub fn logs_dir() -> Result<PathBuf> {
    let dir = data_dir()?.join("logs");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("settings.json"))
}

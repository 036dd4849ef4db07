use std::path::PathBuf;
use thiserror::Error;

/// Typed failures surfaced to the frontend. Plumbing errors stay as
/// `anyhow::Error` and wrap these via `?`.
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("{0} does not look like an RPG Maker game folder")]
    NotAGame(PathBuf),
    #[error("runtime version '{0}' is not installed")]
    VersionNotInstalled(String),
    #[error("version '{version}' is a {selected} build, but this game needs {required}")]
    RuntimeMismatch {
        version: String,
        selected: &'static str,
        required: &'static str,
    },
    #[error("expected file is missing: {0}")]
    MissingFile(PathBuf),
    #[error("required tool '{0}' was not found in PATH")]
    MissingTool(&'static str),
    #[error("no build of NWJS {0} exists for this architecture")]
    UnsupportedArch(String),
    #[error("unknown engine option '{0}'")]
    UnknownOption(String),
    #[error("operation cancelled")]
    Cancelled,
}

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::info;

use crate::detect::DetectedGame;
use crate::error::LauncherError;
use crate::nwjs::ROSETTA_MARKER;
use crate::runtime::{InstalledVersion, Runtime};

/// A fully assembled launch invocation, kept separate from spawning so it can
/// be inspected and tested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

pub fn build_launch_command(version: &InstalledVersion, game: &DetectedGame) -> Result<LaunchCommand> {
    let required = game.kind.runtime();
    if version.runtime != required {
        return Err(LauncherError::RuntimeMismatch {
            version: version.name.clone(),
            selected: version.runtime.label(),
            required: required.label(),
        }
        .into());
    }

    let cmd = match version.runtime {
        Runtime::Nwjs => {
            let bin = version
                .path
                .join("nwjs.app")
                .join("Contents")
                .join("MacOS")
                .join("nwjs");
            let game_arg = game.folder.display().to_string();
            if version.path.join(ROSETTA_MARKER).exists() {
                // x86-64 build on Apple Silicon: wrap in the arch shim.
                LaunchCommand {
                    program: PathBuf::from("arch"),
                    args: vec!["-x86_64".into(), bin.display().to_string(), game_arg],
                    cwd: None,
                }
            } else {
                LaunchCommand { program: bin, args: vec![game_arg], cwd: None }
            }
        }
        Runtime::MkxpZ => LaunchCommand {
            program: version
                .path
                .join(crate::mkxpz::APP_BUNDLE)
                .join("Contents")
                .join("MacOS")
                .join("Z-universal"),
            args: Vec::new(),
            // mkxp-z reads mkxp.json from the working directory.
            cwd: Some(game.folder.clone()),
        },
        Runtime::EasyRpg => LaunchCommand {
            program: version
                .path
                .join(crate::easyrpg::APP_BUNDLE)
                .join("Contents")
                .join("MacOS")
                .join("EasyRPG Player"),
            args: vec!["--project-path".into(), game.folder.display().to_string()],
            cwd: None,
        },
    };
    Ok(cmd)
}

/// Spawn the runtime detached; the child is not waited on and its exit status
/// is not tracked.
pub fn launch_game(version: &InstalledVersion, game: &DetectedGame) -> Result<()> {
    let launch = build_launch_command(version, game)?;
    let mut cmd = Command::new(&launch.program);
    cmd.args(&launch.args);
    if let Some(dir) = &launch.cwd {
        cmd.current_dir(dir);
    }
    let child = cmd
        .spawn()
        .with_context(|| format!("spawn {}", launch.program.display()))?;
    info!(
        "launched {} with {} (pid {})",
        game.kind.label(),
        version.name,
        child.id()
    );
    Ok(())
}

use clap::{Parser, Subcommand, ValueEnum};
use rpgm_launcher_core::Runtime;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rpgm-launcher",
    version,
    about = "Run RPG Maker games on modern systems with NWJS, MKXP-Z and EasyRPG"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List installed runtime versions, or available ones with --remote
    List {
        #[arg(long, help = "Query the remote version listings instead of the disk")]
        remote: bool,

        #[arg(long, value_enum, help = "Restrict to one runtime family")]
        runtime: Option<RuntimeArg>,
    },

    /// Download and install a runtime version
    Install {
        #[arg(value_enum)]
        runtime: RuntimeArg,

        #[arg(help = "Version or release tag; defaults to the newest available")]
        version: Option<String>,

        #[arg(long, help = "Install the Intel build and run it under Rosetta 2")]
        rosetta: bool,
    },

    /// Remove an installed runtime version
    Uninstall {
        #[arg(help = "Version directory name, e.g. v0.84.0 or mkxpz-v2.4.2")]
        version: String,
    },

    /// Classify a game folder without changing anything
    Detect { folder: PathBuf },

    /// Detect a game folder, apply the configured patches, and launch it
    Play {
        folder: PathBuf,

        #[arg(long, help = "Runtime version directory to use; defaults to the last used")]
        version: Option<String>,
    },

    /// Export a game plus its runtime as a self-contained application
    Export {
        folder: PathBuf,
        dest: PathBuf,

        #[arg(long, help = "Application name; defaults to the game folder name")]
        name: Option<String>,

        #[arg(long, help = "Runtime version directory to bundle")]
        version: Option<String>,
    },

    /// Show or change launcher settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Inspect or change the advanced MKXP-Z engine options
    EngineConfig {
        #[command(subcommand)]
        action: EngineConfigAction,
    },

    /// Check for a newer launcher release
    CheckUpdate,

    /// Store or clear a GitHub personal access token for release listings
    Token {
        token: Option<String>,

        #[arg(long, conflicts_with = "token")]
        clear: bool,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the current settings
    Show,
    /// Toggle a setting: extract-localized, add-cheats or optimize-space
    Set {
        key: String,
        #[arg(value_parser = clap::value_parser!(bool))]
        value: bool,
    },
}

#[derive(Subcommand)]
pub enum EngineConfigAction {
    /// Print every option with its enabled state and value
    List,
    /// Force an option into the generated mkxp.json
    Enable { option: String },
    /// Stop forcing an option
    Disable { option: String },
    /// Change an option's value (parsed as JSON, else taken as a string)
    Set { option: String, value: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RuntimeArg {
    Nwjs,
    Mkxpz,
    Easyrpg,
}

impl From<RuntimeArg> for Runtime {
    fn from(value: RuntimeArg) -> Self {
        match value {
            RuntimeArg::Nwjs => Runtime::Nwjs,
            RuntimeArg::Mkxpz => Runtime::MkxpZ,
            RuntimeArg::Easyrpg => Runtime::EasyRpg,
        }
    }
}

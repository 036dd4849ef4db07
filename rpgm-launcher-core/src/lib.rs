pub mod error;
pub mod paths;
pub mod settings;
pub mod runtime;
pub mod detect;
pub mod patch;
pub mod unpack;
pub mod cheats;
pub mod optimize;
pub mod github;
pub mod download;
pub mod nwjs;
pub mod mkxpz;
pub mod easyrpg;
pub mod engine_config;
pub mod launch;
pub mod export;
pub mod update;
pub mod jobs;
pub mod logging;

pub use error::LauncherError;
pub use settings::{AppSettings, SettingsStore, LAUNCHER_VERSION};
pub use runtime::{find_installed, installed_versions, uninstall, InstalledVersion, Runtime};
pub use detect::{detect_game, DetectedGame, GameKind, RgssVersion};
pub use patch::fix_package_name;
pub use unpack::extract_localized_assets;
pub use cheats::{disable_cheats, enable_cheats};
pub use optimize::{optimize_space, OptimizeReport};
pub use github::{fetch_releases, load_personal_access_token, set_personal_access_token, GitHubAsset, GitHubRelease, GitHubRateLimit};
pub use engine_config::EngineConfig;
pub use launch::{build_launch_command, launch_game, LaunchCommand};
pub use export::export_standalone;
pub use update::{check_for_update, UpdateNotice};
pub use jobs::CancelFlag;
pub use logging::init_logging;

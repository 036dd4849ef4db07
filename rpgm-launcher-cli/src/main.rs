mod cli;

use anyhow::Result;
use clap::Parser;
use rpgm_launcher_core::{
    self as core, detect_game, nwjs, AppSettings, CancelFlag, DetectedGame, EngineConfig,
    GameKind, Runtime, SettingsStore,
};

use cli::{Cli, Commands, EngineConfigAction, RuntimeArg, SettingsAction};

fn print_progress(msg: &str, pct: u8) {
    println!("[{pct:>3}%] {msg}");
}

#[tokio::main]
async fn main() -> Result<()> {
    core::init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::List { remote, runtime } => list(remote, runtime.map(Into::into)).await,
        Commands::Install { runtime, version, rosetta } => install(runtime, version, rosetta).await,
        Commands::Uninstall { version } => {
            core::uninstall(&version)?;
            println!("Removed {version}");
            Ok(())
        }
        Commands::Detect { folder } => {
            let game = detect_game(&folder)?;
            println!("{}: {}", game.folder.display(), game.kind.label());
            if let GameKind::Rgss { rtp: Some(rtp), .. } = &game.kind {
                println!("RTP package: {rtp}");
            }
            println!("Runtime family: {}", game.kind.runtime().label());
            Ok(())
        }
        Commands::Play { folder, version } => play(folder, version).await,
        Commands::Export { folder, dest, name, version } => {
            export(folder, dest, name, version).await
        }
        Commands::Settings { action } => settings(action),
        Commands::EngineConfig { action } => engine_config(action),
        Commands::CheckUpdate => check_update().await,
        Commands::Token { token, clear } => {
            if clear {
                core::set_personal_access_token(None)?;
                println!("Token cleared");
            } else {
                let token = token.ok_or_else(|| anyhow::anyhow!("pass a token or --clear"))?;
                core::set_personal_access_token(Some(token))?;
                println!("Token stored");
            }
            Ok(())
        }
    }
}

async fn list(remote: bool, runtime: Option<Runtime>) -> Result<()> {
    if !remote {
        let versions = core::installed_versions(runtime)?;
        if versions.is_empty() {
            println!("No runtimes installed. Try: rpgm-launcher install nwjs");
            return Ok(());
        }
        for v in versions {
            println!("{:<24} {}", v.name, v.runtime.label());
        }
        return Ok(());
    }

    let families = match runtime {
        Some(r) => vec![r],
        None => vec![Runtime::Nwjs, Runtime::MkxpZ, Runtime::EasyRpg],
    };
    for family in families {
        println!("-- {} --", family.label());
        match family {
            Runtime::Nwjs => {
                let manifest = nwjs::fetch_versions().await?;
                for v in manifest.versions.iter().take(15) {
                    let arm = if v.supports("osx-arm64") { "" } else { "  (x64 only)" };
                    println!("{}{arm}", v.version);
                }
            }
            Runtime::MkxpZ | Runtime::EasyRpg => {
                let (owner, repo) = release_source(family);
                let mut rate_limit = core::GitHubRateLimit::default();
                let releases = core::fetch_releases(owner, repo, &mut rate_limit).await?;
                for r in releases.iter().filter(|r| !r.prerelease).take(10) {
                    if let Some(tag) = &r.tag_name {
                        println!("{tag}");
                    }
                }
            }
        }
    }
    Ok(())
}

fn release_source(runtime: Runtime) -> (&'static str, &'static str) {
    match runtime {
        Runtime::MkxpZ => (core::mkxpz::GITHUB_OWNER, core::mkxpz::GITHUB_REPO),
        Runtime::EasyRpg => (core::easyrpg::GITHUB_OWNER, core::easyrpg::GITHUB_REPO),
        Runtime::Nwjs => unreachable!("NWJS does not use GitHub releases"),
    }
}

async fn install(runtime: RuntimeArg, version: Option<String>, rosetta: bool) -> Result<()> {
    match Runtime::from(runtime) {
        Runtime::Nwjs => {
            let manifest = nwjs::fetch_versions().await?;
            let wanted = version
                .or_else(|| manifest.latest.clone())
                .ok_or_else(|| anyhow::anyhow!("version listing is empty"))?;
            let info = manifest
                .find(&wanted)
                .ok_or_else(|| anyhow::anyhow!("NWJS {wanted} is not in the version listing"))?;
            let use_rosetta = match nwjs::choose_arch(info) {
                nwjs::ArchChoice::Native(_) => rosetta,
                nwjs::ArchChoice::NeedsRosetta if rosetta => true,
                nwjs::ArchChoice::NeedsRosetta => {
                    anyhow::bail!(
                        "{} has no Apple Silicon build; rerun with --rosetta to use the Intel build",
                        info.version
                    );
                }
            };
            nwjs::install(info, use_rosetta, print_progress).await?;
        }
        family @ (Runtime::MkxpZ | Runtime::EasyRpg) => {
            let (owner, repo) = release_source(family);
            let mut rate_limit = core::GitHubRateLimit::default();
            let releases = core::fetch_releases(owner, repo, &mut rate_limit).await?;
            let release = match &version {
                Some(tag) => releases
                    .iter()
                    .find(|r| r.tag_name.as_deref() == Some(tag.as_str()))
                    .ok_or_else(|| anyhow::anyhow!("no release tagged {tag}"))?,
                None => releases
                    .iter()
                    .find(|r| !r.prerelease)
                    .ok_or_else(|| anyhow::anyhow!("no releases found"))?,
            };
            match family {
                Runtime::MkxpZ => core::mkxpz::install(release, print_progress).await?,
                Runtime::EasyRpg => core::easyrpg::install(release, print_progress).await?,
                Runtime::Nwjs => unreachable!(),
            };
        }
    }
    Ok(())
}

/// The per-engine compatibility pass, shared by play and export.
async fn apply_patches(settings: &AppSettings, game: &DetectedGame) -> Result<()> {
    match &game.kind {
        GameKind::MvMz => {
            core::fix_package_name(&game.folder)?;
            if settings.extract_localized {
                core::extract_localized_assets(&game.folder)?;
            }
            if settings.add_cheats {
                core::enable_cheats(&game.folder).await?;
            } else {
                core::disable_cheats(&game.folder)?;
            }
        }
        GameKind::Rgss { version, .. } => {
            EngineConfig::load()?.write_mkxp_json(&game.folder, *version)?;
        }
        GameKind::Rpg2k => {}
    }
    if settings.optimize_space {
        let report = core::optimize_space(&game.folder, &game.kind)?;
        if report.removed > 0 {
            println!("Reclaimed {} ({} entries)", report.human_bytes(), report.removed);
        }
    }
    Ok(())
}

fn pick_version(
    requested: Option<&str>,
    settings: &AppSettings,
    game: &DetectedGame,
) -> Result<core::InstalledVersion> {
    let family = game.kind.runtime();
    if let Some(name) = requested {
        let version = core::find_installed(name)?;
        return Ok(version);
    }
    if let Some(name) = settings.last_selected_version.as_deref() {
        if let Ok(version) = core::find_installed(name) {
            if version.runtime == family {
                return Ok(version);
            }
        }
    }
    core::installed_versions(Some(family))?
        .pop()
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no {} runtime installed; run 'rpgm-launcher install {}'",
                family.label(),
                match family {
                    Runtime::Nwjs => "nwjs",
                    Runtime::MkxpZ => "mkxpz",
                    Runtime::EasyRpg => "easyrpg",
                }
            )
        })
}

async fn play(folder: std::path::PathBuf, version: Option<String>) -> Result<()> {
    let store = SettingsStore::new()?;
    let mut settings = store.load()?;

    let game = detect_game(&folder)?;
    println!("{}", game.kind.label());
    apply_patches(&settings, &game).await?;

    let runtime_version = pick_version(version.as_deref(), &settings, &game)?;
    core::launch_game(&runtime_version, &game)?;
    println!("Launched with {}", runtime_version.name);

    settings.last_folder = Some(game.folder.display().to_string());
    settings.last_selected_version = Some(runtime_version.name.clone());
    store.save(&settings)?;
    Ok(())
}

async fn export(
    folder: std::path::PathBuf,
    dest: std::path::PathBuf,
    name: Option<String>,
    version: Option<String>,
) -> Result<()> {
    let store = SettingsStore::new()?;
    let settings = store.load()?;

    let game = detect_game(&folder)?;
    apply_patches(&settings, &game).await?;

    let runtime_version = pick_version(version.as_deref(), &settings, &game)?;
    let app_name = name.unwrap_or_else(|| {
        game.folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Game".to_string())
    });

    let cancel = CancelFlag::new();
    let out = core::export_standalone(
        &runtime_version,
        &game,
        &dest,
        &app_name,
        &cancel,
        print_progress,
    )?;
    println!("Exported to {}", out.display());
    Ok(())
}

fn settings(action: SettingsAction) -> Result<()> {
    let store = SettingsStore::new()?;
    let mut settings = store.load()?;
    match action {
        SettingsAction::Show => {
            println!("extract-localized  {}", settings.extract_localized);
            println!("add-cheats         {}", settings.add_cheats);
            println!("optimize-space     {}", settings.optimize_space);
            if let Some(v) = &settings.last_selected_version {
                println!("last version       {v}");
            }
            if let Some(f) = &settings.last_folder {
                println!("last folder        {f}");
            }
        }
        SettingsAction::Set { key, value } => {
            match key.as_str() {
                "extract-localized" => settings.extract_localized = value,
                "add-cheats" => settings.add_cheats = value,
                "optimize-space" => settings.optimize_space = value,
                other => anyhow::bail!(
                    "unknown setting '{other}' (expected extract-localized, add-cheats or optimize-space)"
                ),
            }
            store.save(&settings)?;
            println!("{key} = {value}");
        }
    }
    Ok(())
}

fn engine_config(action: EngineConfigAction) -> Result<()> {
    let mut config = EngineConfig::load()?;
    match action {
        EngineConfigAction::List => {
            for (name, enabled, value) in config.options() {
                let mark = if enabled { "*" } else { " " };
                println!("{mark} {name:<20} {value}");
            }
            println!("(* = written to mkxp.json before each launch)");
        }
        EngineConfigAction::Enable { option } => {
            config.set_enabled(&option, true)?;
            config.save()?;
        }
        EngineConfigAction::Disable { option } => {
            config.set_enabled(&option, false)?;
            config.save()?;
        }
        EngineConfigAction::Set { option, value } => {
            let parsed = serde_json::from_str(&value)
                .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
            config.set_value(&option, parsed)?;
            config.save()?;
        }
    }
    Ok(())
}

async fn check_update() -> Result<()> {
    let store = SettingsStore::new()?;
    let mut settings = store.load()?;
    match core::check_for_update(&settings).await? {
        Some(notice) => {
            println!("New release {} available: {}", notice.tag, notice.url);
            settings.last_update_seen = Some(notice.tag);
            store.save(&settings)?;
        }
        None => println!("Launcher is up to date (v{})", core::LAUNCHER_VERSION),
    }
    Ok(())
}

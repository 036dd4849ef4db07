use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::LauncherError;
use crate::github::USER_AGENT;

// emerladCoder's MV/MZ cheat menu plugin, loaded at runtime from js/plugins.
const CHEAT_FILES: [(&str, &str); 2] = [
    (
        "Cheat_Menu.js",
        "https://raw.githubusercontent.com/emerladCoder/RPG-Maker-MV-Cheat-Menu-Plugin/master/Cheat_Menu.js",
    ),
    (
        "Cheat_Menu.css",
        "https://raw.githubusercontent.com/emerladCoder/RPG-Maker-MV-Cheat-Menu-Plugin/master/Cheat_Menu.css",
    ),
];

const MARKER_START: &str = "// --- cheat menu (injected) ---";
const MARKER_END: &str = "// --- end cheat menu ---";

static BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)// --- cheat menu \(injected\) ---.*?// --- end cheat menu ---\n?").unwrap()
});
static LOOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^.*Cheat_Menu.*\r?\n?").unwrap());

/// The script entry file the loader block goes into: `www/js/main.js` for MV,
/// `js/main.js` for MZ.
fn entry_file(game_dir: &Path) -> Option<PathBuf> {
    let mv = game_dir.join("www").join("js").join("main.js");
    if mv.is_file() {
        return Some(mv);
    }
    let mz = game_dir.join("js").join("main.js");
    if mz.is_file() {
        return Some(mz);
    }
    None
}

fn plugins_dir(entry: &Path) -> PathBuf {
    // entry is <...>/js/main.js
    entry.parent().map(|p| p.join("plugins")).unwrap_or_else(|| PathBuf::from("plugins"))
}

// Paths in the block are relative to index.html, which sits one level above
// the js directory in both MV and MZ.
fn loader_block() -> String {
    format!(
        "{MARKER_START}\n\
         var cheatScript = document.createElement(\"script\");\n\
         cheatScript.src = \"js/plugins/Cheat_Menu.js\";\n\
         document.body.appendChild(cheatScript);\n\
         var cheatCss = document.createElement(\"link\");\n\
         cheatCss.rel = \"stylesheet\";\n\
         cheatCss.href = \"js/plugins/Cheat_Menu.css\";\n\
         document.head.appendChild(cheatCss);\n\
         {MARKER_END}\n"
    )
}

fn inject_loader(text: &str) -> Option<String> {
    if text.contains(MARKER_START) {
        return None;
    }
    let mut out = text.to_string();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&loader_block());
    Some(out)
}

fn strip_cheat_lines(text: &str) -> String {
    let out = BLOCK.replace_all(text, "");
    let out = LOOSE.replace_all(&out, "");
    out.into_owned()
}

/// Download the cheat plugin into the game's plugin directory and append the
/// loader block to the entry file. Idempotent: an already-marked entry file
/// is left untouched.
pub async fn enable_cheats(game_dir: &Path) -> Result<()> {
    let entry = entry_file(game_dir)
        .ok_or_else(|| LauncherError::MissingFile(game_dir.join("js").join("main.js")))?;
    let text = fs::read_to_string(&entry)?;
    let Some(patched) = inject_loader(&text) else {
        info!("cheat menu already injected into {}", entry.display());
        return Ok(());
    };

    let plugins = plugins_dir(&entry);
    fs::create_dir_all(&plugins)?;
    let client = reqwest::Client::new();
    for (name, url) in CHEAT_FILES {
        let bytes = client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        fs::write(plugins.join(name), &bytes)?;
    }

    fs::write(&entry, patched)?;
    info!("cheat menu injected into {}", entry.display());
    Ok(())
}

/// Strip the loader block (and any stray plugin references) from the entry
/// file and delete the plugin files. Returns true if the entry file changed.
pub fn disable_cheats(game_dir: &Path) -> Result<bool> {
    let Some(entry) = entry_file(game_dir) else { return Ok(false) };
    let text = fs::read_to_string(&entry)?;
    let stripped = strip_cheat_lines(&text);
    let changed = stripped != text;
    if changed {
        fs::write(&entry, &stripped)?;
        info!("cheat menu removed from {}", entry.display());
    }
    let plugins = plugins_dir(&entry);
    for (name, _) in CHEAT_FILES {
        let _ = fs::remove_file(plugins.join(name));
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN_JS: &str = "const scriptUrls = [\n    \"js/main.js\"\n];\nPluginManager.setup($plugins);\n";

    #[test]
    fn inject_then_strip_roundtrips() {
        let injected = inject_loader(MAIN_JS).unwrap();
        assert!(injected.contains(MARKER_START));
        assert!(injected.contains("Cheat_Menu.js"));
        // second injection is a no-op
        assert!(inject_loader(&injected).is_none());

        let stripped = strip_cheat_lines(&injected);
        assert_eq!(stripped, MAIN_JS);
    }

    #[test]
    fn strip_removes_stray_references() {
        let text = "foo();\nvar x = \"js/plugins/Cheat_Menu.js\";\nbar();\n";
        assert_eq!(strip_cheat_lines(text), "foo();\nbar();\n");
    }

    #[test]
    fn entry_file_prefers_mv_layout() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("www").join("js")).unwrap();
        fs::write(dir.path().join("www").join("js").join("main.js"), MAIN_JS).unwrap();
        let entry = entry_file(dir.path()).unwrap();
        assert!(entry.ends_with(Path::new("www").join("js").join("main.js")));

        let mz = tempfile::tempdir().unwrap();
        fs::create_dir_all(mz.path().join("js")).unwrap();
        fs::write(mz.path().join("js").join("main.js"), MAIN_JS).unwrap();
        assert!(entry_file(mz.path()).unwrap().ends_with(Path::new("js").join("main.js")));
    }

    #[test]
    fn disable_without_entry_file_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!disable_cheats(dir.path()).unwrap());
    }

    #[test]
    fn disable_reverts_an_injected_file() {
        let dir = tempfile::tempdir().unwrap();
        let js = dir.path().join("js");
        fs::create_dir_all(&js).unwrap();
        fs::write(js.join("main.js"), inject_loader(MAIN_JS).unwrap()).unwrap();
        fs::create_dir_all(js.join("plugins")).unwrap();
        fs::write(js.join("plugins").join("Cheat_Menu.js"), b"x").unwrap();

        assert!(disable_cheats(dir.path()).unwrap());
        assert_eq!(fs::read_to_string(js.join("main.js")).unwrap(), MAIN_JS);
        assert!(!js.join("plugins").join("Cheat_Menu.js").exists());
    }
}

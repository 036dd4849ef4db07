use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::LauncherError;

pub const PLACEHOLDER_NAME: &str = "tempname";

/// NWJS refuses to start a package whose manifest `name` is blank, which is
/// common in machine-translated rereleases. Rewrite it in place.
///
/// Returns true if the file was modified.
pub fn fix_package_name(game_dir: &Path) -> Result<bool> {
    let path = game_dir.join("package.json");
    if !path.is_file() {
        return Err(LauncherError::MissingFile(path).into());
    }
    let bytes = fs::read(&path)?;
    let text = decode_utf8_tolerant(&bytes);
    let mut doc: Value =
        serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;

    let blank = doc
        .get("name")
        .and_then(Value::as_str)
        .map(|s| s.trim().is_empty())
        .unwrap_or(false);
    if !blank {
        return Ok(false);
    }

    doc["name"] = Value::String(PLACEHOLDER_NAME.to_string());
    fs::write(&path, to_json_indent4(&doc)?)?;
    info!("package.json had a blank name, wrote '{PLACEHOLDER_NAME}'");
    Ok(true)
}

fn decode_utf8_tolerant(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf".as_slice()).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

// The original manifests use 4-space indentation; keep diffs quiet.
fn to_json_indent4(doc: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let fmt = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    doc.serialize(&mut ser)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_gets_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "  ", "main": "index.html"}"#,
        )
        .unwrap();
        assert!(fix_package_name(dir.path()).unwrap());
        let doc: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("package.json")).unwrap())
                .unwrap();
        assert_eq!(doc["name"], PLACEHOLDER_NAME);
        assert_eq!(doc["main"], "index.html");
    }

    #[test]
    fn real_name_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let original = r#"{"name": "mygame", "main": "index.html"}"#;
        fs::write(dir.path().join("package.json"), original).unwrap();
        assert!(!fix_package_name(dir.path()).unwrap());
        assert_eq!(
            fs::read_to_string(dir.path().join("package.json")).unwrap(),
            original
        );
    }

    #[test]
    fn missing_name_field_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"main": "index.html"}"#).unwrap();
        assert!(!fix_package_name(dir.path()).unwrap());
    }

    #[test]
    fn bom_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = b"\xef\xbb\xbf".to_vec();
        bytes.extend_from_slice(br#"{"name": ""}"#);
        fs::write(dir.path().join("package.json"), bytes).unwrap();
        assert!(fix_package_name(dir.path()).unwrap());
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = fix_package_name(dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LauncherError>(),
            Some(LauncherError::MissingFile(_))
        ));
    }
}

use anyhow::Result;
use futures_util::StreamExt;
use reqwest::Client;
use std::fs::{self, File};
use std::io::Cursor;
use std::path::Path;
use zip::ZipArchive;

use crate::github::USER_AGENT;
use crate::logging::ProgressThrottle;

/// Stream a URL into memory, reporting (downloaded, total) bytes. Total is 0
/// when the server sends no Content-Length.
pub async fn download_bytes(url: &str, mut progress: impl FnMut(u64, u64)) -> Result<Vec<u8>> {
    let client = Client::new();
    let resp = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .error_for_status()?;
    let total = resp.content_length().unwrap_or(0);
    let mut stream = resp.bytes_stream();
    let mut data: Vec<u8> = Vec::with_capacity(total as usize);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        data.extend_from_slice(&chunk);
        progress(data.len() as u64, total);
    }
    Ok(data)
}

/// Download with throttled "Downloading: X/Y MB" messages mapped onto the
/// [pct_from, pct_to] window of an overall progress bar.
pub async fn download_with_progress(
    url: &str,
    pct_from: u8,
    pct_to: u8,
    mut progress: impl FnMut(&str, u8),
) -> Result<Vec<u8>> {
    let mut throttler = ProgressThrottle::new(150);
    let span = pct_to.saturating_sub(pct_from) as f32;
    download_bytes(url, |done, total| {
        if total > 0 {
            let pct = pct_from + ((done as f32 / total as f32) * span) as u8;
            let msg = format!("Downloading: {}/{} MB", done / 1_048_576, total / 1_048_576);
            throttler.emit("Downloading:", msg, pct.min(pct_to), |m, p| progress(m, p));
        }
    })
    .await
}

/// Extract an in-memory zip under `dest`, mapped onto the [pct_from, pct_to]
/// progress window. Entry paths are sanitized (no traversal, no absolute
/// paths) and unix modes restored so .app bundles stay executable.
pub fn extract_zip(
    data: &[u8],
    dest: &Path,
    pct_from: u8,
    pct_to: u8,
    mut progress: impl FnMut(&str, u8),
) -> Result<()> {
    let mut zip = ZipArchive::new(Cursor::new(data))?;
    let total = zip.len().max(1);
    fs::create_dir_all(dest)?;
    for i in 0..zip.len() {
        let mut file = zip.by_index(i)?;
        let Some(rel) = sanitize_entry_name(file.name()) else { continue };
        let outpath = dest.join(&rel);
        if file.is_dir() {
            fs::create_dir_all(&outpath).ok();
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent).ok();
            }
            let mut out = File::create(&outpath)?;
            std::io::copy(&mut file, &mut out)?;
        }
        #[cfg(unix)]
        {
            if let Some(mode) = file.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                let _ = fs::set_permissions(&outpath, fs::Permissions::from_mode(mode));
            }
        }
        let pct = pct_from
            + (((i as f32 + 1.0) / total as f32) * pct_to.saturating_sub(pct_from) as f32) as u8;
        progress("Extracting...", pct.min(pct_to));
    }
    Ok(())
}

/// If `dir` contains exactly one subdirectory and nothing else, move its
/// children up one level. Release archives are inconsistent about carrying a
/// top-level folder.
pub fn flatten_single_dir(dir: &Path) -> Result<()> {
    let entries: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    if entries.len() != 1 || !entries[0].path().is_dir() {
        return Ok(());
    }
    let nested = entries[0].path();
    // App bundles are directories too; never unwrap those.
    if nested.extension().map_or(false, |e| e.eq_ignore_ascii_case("app")) {
        return Ok(());
    }
    for entry in fs::read_dir(&nested)? {
        let entry = entry?;
        let to = dir.join(entry.file_name());
        fs::rename(entry.path(), to)?;
    }
    let _ = fs::remove_dir_all(&nested);
    Ok(())
}

fn sanitize_entry_name(name: &str) -> Option<String> {
    let norm = name.replace('\\', "/");
    let mut parts = Vec::new();
    for part in norm.split('/') {
        match part {
            "" | "." => {}
            ".." => return None,
            p => parts.push(p),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

use std::{path::Path, sync::LazyLock};

use regex::Regex;

static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("invalid chars pattern is valid"));
static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("separator pattern is valid"));

/// Makes a string safe to use as a file name on common filesystems.
///
/// Characters that are invalid on Windows are replaced by `_`, runs of
/// whitespace and underscores collapse into a single `_`, and leading or
/// trailing underscores are trimmed.
///
/// Returns `None` for blank input or input that sanitizes to nothing.
pub fn sanitize_filename(name: &str) -> Option<String> {
    if name.trim().is_empty() {
        return None;
    }

    let replaced = INVALID_CHARS.replace_all(name, "_");
    let collapsed = SEPARATOR_RUNS.replace_all(&replaced, "_");
    let sanitized = collapsed.trim_matches('_');

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        None
    } else {
        Some(sanitized.to_string())
    }
}

/// Like [`sanitize_filename`], with a fallback for names that sanitize to nothing.
pub fn sanitize_or(name: &str, fallback: &str) -> String {
    sanitize_filename(name).unwrap_or_else(|| {
        log::warn!(
            "Cannot build a file name from '{}', using '{}'",
            name,
            fallback
        );
        fallback.to_string()
    })
}

/// Creates `dir` (and its parents) if needed.
///
/// # Returns
///
/// `true` if the directory was created by this call, `false` if it already existed.
pub async fn ensure_dir_exists(dir: &Path) -> std::io::Result<bool> {
    if async_fs::metadata(dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        log::debug!("Directory already exists: {}", dir.display());
        return Ok(false);
    }

    async_fs::create_dir_all(dir).await.map_err(|e| {
        log::error!("Error creating directory {}: {}", dir.display(), e);
        e
    })?;
    log::info!("Created directory: {}", dir.display());
    Ok(true)
}

/// Builds the search query used for a track on the audio sources.
pub fn search_query(artist: &str, title: &str, album: Option<&str>) -> String {
    [Some(artist), Some(title), album, Some("Audio")]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats milliseconds as `m:ss`.
pub fn format_duration(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

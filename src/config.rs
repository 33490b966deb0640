//! Configuration management for the Spotify Playlist Ripper.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. The configuration system follows a hierarchical
//! approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the current working directory
//! 3. `.env` file in the local data directory
//! 4. Application defaults
//!
//! Apart from the two Spotify credentials every value has a default, so the
//! getters never fail. Suspicious values are reported by [`validate_settings`].

use std::{env, path::PathBuf, sync::LazyLock};

use regex::Regex;

pub const DEFAULT_DOWNLOAD_DIR: &str = "Downloads";
pub const DEFAULT_AUDIO_BITRATE: &str = "320k";
pub const DEFAULT_LOG_LEVEL: &str = "INFO";
pub const DEFAULT_LOG_FILE: &str = "spotrip.log";
pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

pub const CLIENT_ID_VAR: &str = "SPOTIPY_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SPOTIPY_CLIENT_SECRET";

const LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

static BITRATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)k$").expect("bitrate pattern is valid"));

/// Loads environment variables from `.env` files.
///
/// The `.env` in the working directory is read first, then the one in the
/// platform-specific local data directory:
/// - Linux: `~/.local/share/spotrip/.env`
/// - macOS: `~/Library/Application Support/spotrip/.env`
/// - Windows: `%LOCALAPPDATA%/spotrip/.env`
///
/// Variables that are already set are never overridden. A missing file is not
/// an error, a file that cannot be parsed is.
///
/// # Returns
///
/// The list of files that were loaded.
pub async fn load_env() -> Result<Vec<PathBuf>, String> {
    let mut loaded = Vec::new();

    let mut candidates = vec![PathBuf::from(".env")];
    if let Some(mut path) = dirs::data_local_dir() {
        path.push("spotrip/.env");
        candidates.push(path);
    }

    for path in candidates {
        if !async_fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            continue;
        }

        dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
        loaded.push(path);
    }

    Ok(loaded)
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Returns the Spotify Web API base URL.
///
/// # Example
///
/// ```
/// let api_url = spotify_apiurl(); // e.g., "https://api.spotify.com/v1"
/// ```
pub fn spotify_apiurl() -> String {
    var_or("SPOTIFY_API_URL", DEFAULT_SPOTIFY_API_URL)
}

/// Returns the Spotify token endpoint used for the client credentials grant.
pub fn spotify_apitoken_url() -> String {
    var_or("SPOTIFY_API_TOKEN_URL", DEFAULT_SPOTIFY_TOKEN_URL)
}

/// Folder used when no download folder is given on the command line.
pub fn download_dir() -> String {
    var_or("DEFAULT_DOWNLOAD_DIR", DEFAULT_DOWNLOAD_DIR)
}

/// Encoder bitrate as passed to ffmpeg, e.g. `320k`.
pub fn audio_bitrate() -> String {
    var_or("DEFAULT_AUDIO_BITRATE", DEFAULT_AUDIO_BITRATE)
}

/// Target bitrate in kbps. Falls back to 320 when `DEFAULT_AUDIO_BITRATE` is malformed.
pub fn target_bitrate_kbps() -> u32 {
    parse_bitrate_kbps(&audio_bitrate()).unwrap_or(320)
}

pub fn log_level() -> String {
    var_or("LOG_LEVEL", DEFAULT_LOG_LEVEL)
}

pub fn log_file() -> String {
    var_or("LOG_FILE", DEFAULT_LOG_FILE)
}

pub fn ytdlp_bin() -> String {
    var_or("YTDLP_BIN", "yt-dlp")
}

pub fn ffmpeg_bin() -> String {
    var_or("FFMPEG_BIN", "ffmpeg")
}

pub fn ffprobe_bin() -> String {
    var_or("FFPROBE_BIN", "ffprobe")
}

/// Parses bitrates written like `320k` (case-insensitive) into kbps.
pub fn parse_bitrate_kbps(value: &str) -> Option<u32> {
    BITRATE_PATTERN
        .captures(value.trim())
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|kbps| *kbps > 0)
}

/// Maps the configured level onto an `env_logger` filter directive.
///
/// Unknown levels fall back to `info`.
pub fn log_filter(level: &str) -> &'static str {
    match level.trim().to_uppercase().as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// The values checked by [`validate_settings`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub download_dir: String,
    pub audio_bitrate: String,
    pub log_level: String,
    pub log_file: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            download_dir: download_dir(),
            audio_bitrate: audio_bitrate(),
            log_level: log_level(),
            log_file: log_file(),
        }
    }
}

/// Checks the settings and returns one message per suspicious value.
///
/// Never fails: the application keeps running with the defaults described in
/// each message.
pub fn validate_settings(settings: &Settings) -> Vec<String> {
    let mut warnings = Vec::new();

    if settings.download_dir.trim().is_empty() {
        warnings.push(format!(
            "DEFAULT_DOWNLOAD_DIR='{}' looks invalid. Pass a download folder explicitly.",
            settings.download_dir
        ));
    }

    if parse_bitrate_kbps(&settings.audio_bitrate).is_none() {
        warnings.push(format!(
            "DEFAULT_AUDIO_BITRATE='{}' does not match the expected pattern like '320k'. Using 320 kbps for validation.",
            settings.audio_bitrate
        ));
    }

    if !LOG_LEVELS.contains(&settings.log_level.trim().to_uppercase().as_str()) {
        warnings.push(format!(
            "LOG_LEVEL='{}' is not a valid log level. Expected one of: {}. Using INFO.",
            settings.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if settings.log_file.trim().is_empty() {
        warnings.push(format!(
            "LOG_FILE='{}' looks invalid. Expected a file path.",
            settings.log_file
        ));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            download_dir: "Downloads".to_string(),
            audio_bitrate: "320k".to_string(),
            log_level: "INFO".to_string(),
            log_file: "spotrip.log".to_string(),
        }
    }

    #[test]
    fn test_parse_bitrate_kbps() {
        assert_eq!(parse_bitrate_kbps("320k"), Some(320));
        assert_eq!(parse_bitrate_kbps("192K"), Some(192));
        assert_eq!(parse_bitrate_kbps(" 256k "), Some(256));
        assert_eq!(parse_bitrate_kbps("320"), None);
        assert_eq!(parse_bitrate_kbps("0k"), None);
        assert_eq!(parse_bitrate_kbps("fast"), None);
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter("DEBUG"), "debug");
        assert_eq!(log_filter("warning"), "warn");
        assert_eq!(log_filter("CRITICAL"), "error");
        assert_eq!(log_filter("verbose"), "info");
    }

    #[test]
    fn test_validate_settings_accepts_defaults() {
        assert!(validate_settings(&settings()).is_empty());
    }

    #[test]
    fn test_validate_settings_reports_each_problem() {
        let bad = Settings {
            download_dir: "  ".to_string(),
            audio_bitrate: "high".to_string(),
            log_level: "LOUD".to_string(),
            log_file: String::new(),
        };

        let warnings = validate_settings(&bad);
        assert_eq!(warnings.len(), 4);
        assert!(warnings[1].contains("DEFAULT_AUDIO_BITRATE"));
        assert!(warnings[2].contains("LOG_LEVEL"));
    }
}

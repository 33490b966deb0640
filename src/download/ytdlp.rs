use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::AudioSource;
use crate::{
    error::{Error, Result},
    types::Track,
    utils,
};

pub const MAX_SEARCH_RESULTS: usize = 3;
/// Search results shorter than this are previews or jingles.
pub const MIN_DURATION_SECS: f64 = 45.0;
/// Sources below this bitrate can't produce a usable 320 kbps file.
pub const MIN_SOURCE_BITRATE_KBPS: f64 = 128.0;

/// One entry of `yt-dlp --dump-json` output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchEntry {
    pub title: Option<String>,
    pub webpage_url: Option<String>,
    pub url: Option<String>,
    pub duration: Option<f64>,
    pub abr: Option<f64>,
    pub tbr: Option<f64>,
    pub vcodec: Option<String>,
}

impl SearchEntry {
    pub fn link(&self) -> Option<&str> {
        self.webpage_url
            .as_deref()
            .or(self.url.as_deref())
            .filter(|u| !u.is_empty())
    }

    /// Audio bitrate of the selected format. `tbr` only counts for audio-only formats.
    pub fn reported_bitrate(&self) -> Option<f64> {
        self.abr.or_else(|| match self.vcodec.as_deref() {
            Some("none") => self.tbr,
            _ => None,
        })
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown Title")
    }
}

/// Applies the pre-download filters and returns the links worth downloading,
/// in search order.
pub fn select_candidates(source: &str, entries: &[SearchEntry], max: usize) -> Vec<String> {
    let mut links = Vec::new();

    for (i, entry) in entries.iter().take(max).enumerate() {
        let position = i + 1;
        let Some(link) = entry.link() else {
            log::warn!("Skipping {} result {} (no URL found)", source, position);
            continue;
        };

        if let Some(duration) = entry.duration {
            if duration < MIN_DURATION_SECS {
                log::info!(
                    "Skipping {} result {} ('{}'): duration {}s below {}s",
                    source,
                    position,
                    entry.display_title(),
                    duration,
                    MIN_DURATION_SECS
                );
                continue;
            }
        }

        match entry.reported_bitrate() {
            Some(abr) if abr < MIN_SOURCE_BITRATE_KBPS => {
                log::info!(
                    "Skipping {} result {} ('{}'): source bitrate {}kbps below {}kbps",
                    source,
                    position,
                    entry.display_title(),
                    abr,
                    MIN_SOURCE_BITRATE_KBPS
                );
                continue;
            }
            Some(_) => {}
            None => log::warn!(
                "Could not determine audio bitrate for {} result '{}', trying anyway",
                source,
                entry.display_title()
            ),
        }

        links.push(link.to_string());
    }

    links
}

/// Parses the line-delimited JSON printed by `yt-dlp --dump-json`.
///
/// Lines that aren't entries (warnings that leak to stdout) are ignored.
pub fn parse_search_output(stdout: &str) -> Vec<SearchEntry> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .filter_map(|line| serde_json::from_str::<SearchEntry>(line).ok())
        .collect()
}

/// A search-backed source driven by the `yt-dlp` binary.
pub struct YtDlpSource {
    name: String,
    search_prefix: String,
    bin: String,
    max_results: usize,
}

impl YtDlpSource {
    pub fn new(name: &str, search_prefix: &str, bin: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            search_prefix: search_prefix.to_string(),
            bin: bin.into(),
            max_results: MAX_SEARCH_RESULTS,
        }
    }

    pub fn soundcloud(bin: impl Into<String>) -> Self {
        Self::new("SoundCloud", "scsearch", bin)
    }

    pub fn youtube(bin: impl Into<String>) -> Self {
        Self::new("YouTube", "ytsearch", bin)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchEntry>> {
        let output = Command::new(&self.bin)
            .args([
                "--dump-json",
                "--no-warnings",
                "--no-playlist",
                "--skip-download",
                "--ignore-errors",
                "-f",
                "bestaudio/best",
            ])
            .arg(format!(
                "{}{}:{}",
                self.search_prefix, self.max_results, query
            ))
            .output()
            .await
            .map_err(|e| Error::tool(&self.bin, e.to_string()))?;

        let entries = parse_search_output(&String::from_utf8_lossy(&output.stdout));
        if entries.is_empty() && !output.status.success() {
            return Err(Error::tool(
                &self.bin,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(entries)
    }

    async fn download_link(&self, link: &str, template: &Path) -> Result<PathBuf> {
        let output = Command::new(&self.bin)
            .args([
                "-f",
                "bestaudio/best",
                "--no-playlist",
                "--no-warnings",
                "--no-simulate",
                "--print",
                "after_move:filepath",
                "-o",
            ])
            .arg(template)
            .arg(link)
            .output()
            .await
            .map_err(|e| Error::tool(&self.bin, e.to_string()))?;

        if !output.status.success() {
            return Err(Error::tool(
                &self.bin,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| Error::tool(&self.bin, "download finished without a file path"))
    }
}

#[async_trait]
impl AudioSource for YtDlpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, track: &Track, workdir: &Path) -> Result<PathBuf> {
        let query = utils::search_query(&track.artist, &track.title, track.album.as_deref());
        log::info!(
            "Searching top {} results on {} for: {}",
            self.max_results,
            self.name,
            query
        );

        let entries = self.search(&query).await?;
        if entries.is_empty() {
            return Err(Error::NotAvailable(format!(
                "no results on {} for '{}'",
                self.name, query
            )));
        }

        let links = select_candidates(&self.name, &entries, self.max_results);
        let base = utils::sanitize_or(&format!("{} {}", track.title, track.artist), "track");

        for (i, link) in links.iter().enumerate() {
            let template = workdir.join(format!("{}_attempt_{}.%(ext)s", base, i + 1));
            log::info!("Downloading {} candidate {}: {}", self.name, i + 1, link);

            let path = match self.download_link(link, &template).await {
                Ok(path) => path,
                Err(e) => {
                    log::warn!("Failed to download {}: {}", link, e);
                    continue;
                }
            };

            if async_fs::metadata(&path).await.is_ok() {
                log::info!("Downloaded raw audio to {}", path.display());
                return Ok(path);
            }
            log::warn!(
                "Download of {} reported {} but the file is missing",
                link,
                path.display()
            );
        }

        Err(Error::NotAvailable(format!(
            "all {} results on {} for '{}' failed pre-filter or download",
            entries.len(),
            self.name,
            query
        )))
    }
}

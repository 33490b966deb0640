//! # Track Downloader
//!
//! Turns one [`Track`] into an MP3 in the download folder.
//!
//! ## Flow
//!
//! ```text
//! existing valid MP3? ──yes──▶ Success (skip)
//!        │ no (an existing degraded file becomes the best so far)
//!        ▼
//! for source in [SoundCloud, YouTube]:
//!     fetch raw audio ─▶ encode to MP3 ─▶ write ID3 tags ─▶ validate
//!         accepted  ─▶ move to target, write sidecar, Success
//!         degraded  ─▶ remember the best one, try next source
//! best degraded file? ──yes──▶ Degraded
//!        │ no
//!        ▼
//!     Failed
//! ```
//!
//! The second source is the one re-attempt a track gets. Every intermediate file
//! lives in a per-track scratch directory inside the download folder, removed
//! when the track is done, so the target path only ever holds a finished file.
//! A file at the target is only ever replaced by a better one, never deleted.

mod encode;
mod ytdlp;

pub use encode::{CoverArt, FfmpegEncoder, build_tag, write_tags};
pub use ytdlp::{SearchEntry, YtDlpSource, parse_search_output, select_candidates};

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};

use crate::{
    config,
    error::{Error, Result},
    quality::{self, FfprobeProber, Prober, QualityPolicy, QualityReport},
    types::{DownloadResult, Track, TrackMetadata, TrackStatus},
    utils,
};

/// Source name recorded when a valid file was already on disk without a sidecar.
pub const EXISTING_SOURCE: &str = "Unknown/Existing";

/// Somewhere audio for a track can be found.
#[async_trait]
pub trait AudioSource: Send + Sync {
    fn name(&self) -> &str;

    /// Finds the best match for `track` and downloads it into `workdir`.
    ///
    /// Returns [`Error::NotAvailable`] when nothing suitable was found.
    async fn fetch(&self, track: &Track, workdir: &Path) -> Result<PathBuf>;
}

#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Target and sidecar paths of a track inside the download folder.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPaths {
    pub target: PathBuf,
    pub sidecar: PathBuf,
    pub scratch: PathBuf,
}

impl TrackPaths {
    pub fn new(track: &Track, folder: &Path) -> Self {
        let base = utils::sanitize_or(&format!("{} - {}", track.artist, track.title), "track");
        let scratch_id = track
            .id
            .as_deref()
            .and_then(utils::sanitize_filename)
            .unwrap_or_else(|| base.clone());

        Self {
            target: folder.join(format!("{}.mp3", base)),
            sidecar: folder.join(format!("{}.json", base)),
            scratch: folder.join(format!("_temp_dl_{}", scratch_id)),
        }
    }
}

struct Candidate {
    source: String,
    path: PathBuf,
    report: QualityReport,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        self.report.bitrate_kbps().unwrap_or(0) > other.report.bitrate_kbps().unwrap_or(0)
    }
}

/// What the target path held before downloading.
enum Existing {
    Missing,
    Valid(DownloadResult),
    Degraded(Candidate),
}

pub struct TrackDownloader {
    sources: Vec<Box<dyn AudioSource>>,
    encoder: Box<dyn Encoder>,
    prober: Box<dyn Prober>,
    policy: QualityPolicy,
    http: Option<Client>,
}

impl TrackDownloader {
    pub fn new(
        sources: Vec<Box<dyn AudioSource>>,
        encoder: Box<dyn Encoder>,
        prober: Box<dyn Prober>,
        policy: QualityPolicy,
    ) -> Self {
        Self {
            sources,
            encoder,
            prober,
            policy,
            http: Some(Client::new()),
        }
    }

    /// SoundCloud then YouTube through yt-dlp, ffmpeg and ffprobe, as configured.
    pub fn from_env() -> Self {
        let ytdlp = config::ytdlp_bin();
        Self::new(
            vec![
                Box::new(YtDlpSource::soundcloud(ytdlp.clone())),
                Box::new(YtDlpSource::youtube(ytdlp)),
            ],
            Box::new(FfmpegEncoder::from_env()),
            Box::new(FfprobeProber::from_env()),
            QualityPolicy::new(config::target_bitrate_kbps()),
        )
    }

    /// Don't fetch album covers.
    pub fn without_cover_art(mut self) -> Self {
        self.http = None;
        self
    }

    /// Downloads one track. Never fails: problems end up in the result.
    pub async fn download(&self, track: &Track, folder: &Path) -> DownloadResult {
        let paths = TrackPaths::new(track, folder);

        let existing = match self.check_existing(track, &paths).await {
            Existing::Valid(result) => return result,
            Existing::Degraded(candidate) => Some(candidate),
            Existing::Missing => None,
        };

        if let Err(e) = recreate_dir(&paths.scratch).await {
            log::error!(
                "Cannot prepare scratch directory {}: {}",
                paths.scratch.display(),
                e
            );
            return DownloadResult::failed(track.clone(), format!("scratch directory: {}", e));
        }

        let result = match self.try_sources(track, &paths, existing).await {
            Ok(result) => result,
            Err(e) => DownloadResult::failed(track.clone(), e.to_string()),
        };

        match async_fs::remove_dir_all(&paths.scratch).await {
            Ok(_) => log::debug!("Cleaned up {}", paths.scratch.display()),
            Err(e) => log::error!(
                "Error deleting scratch directory {}: {}",
                paths.scratch.display(),
                e
            ),
        }

        match result.status {
            TrackStatus::Success => log::info!("Successfully processed: {}", track),
            TrackStatus::Degraded => log::warn!("Degraded: {} ({})", track, result.message),
            TrackStatus::Failed => log::error!("Failed: {} ({})", track, result.message),
        }

        result
    }

    async fn check_existing(&self, track: &Track, paths: &TrackPaths) -> Existing {
        if async_fs::metadata(&paths.target).await.is_err() {
            return Existing::Missing;
        }

        log::info!("'{}' already exists. Validating...", paths.target.display());
        let report = quality::validate(
            self.prober.as_ref(),
            &self.policy,
            &paths.target,
            Some(track.duration_ms),
        )
        .await;

        let source = read_sidecar_source(&paths.sidecar)
            .await
            .unwrap_or_else(|| EXISTING_SOURCE.to_string());

        if !report.verdict.is_accepted() {
            log::warn!(
                "Existing file '{}' is degraded ({}). Looking for a better one.",
                paths.target.display(),
                report.verdict.reasons()
            );
            return Existing::Degraded(Candidate {
                source,
                path: paths.target.clone(),
                report,
            });
        }

        Existing::Valid(DownloadResult {
            track: track.clone(),
            status: TrackStatus::Success,
            path: Some(paths.target.clone()),
            source: Some(source),
            bitrate_kbps: report.bitrate_kbps(),
            message: "Already downloaded".to_string(),
        })
    }

    async fn try_sources(
        &self,
        track: &Track,
        paths: &TrackPaths,
        mut best: Option<Candidate>,
    ) -> Result<DownloadResult> {
        let cover = self.fetch_cover_art(track).await;
        let mut problems: Vec<String> = Vec::new();
        let mut unavailable = 0;

        for source in &self.sources {
            let name = source.name().to_string();
            let safe_name = utils::sanitize_or(&name, "source");
            let workdir = paths.scratch.join(format!("{}_raw_downloads", safe_name));
            utils::ensure_dir_exists(&workdir).await?;

            log::info!("Attempting source {} for '{}'", name, track);
            let raw = match source.fetch(track, &workdir).await {
                Ok(raw) => raw,
                Err(e) => {
                    if matches!(e, Error::NotAvailable(_)) {
                        unavailable += 1;
                    }
                    log::info!("No suitable audio from {}: {}", name, e);
                    problems.push(format!("{}: {}", name, e));
                    continue;
                }
            };

            let encoded = paths.scratch.join(format!("{}.mp3", safe_name));
            if let Err(e) = self.encoder.encode(&raw, &encoded).await {
                log::warn!("Conversion to MP3 failed for audio from {}: {}", name, e);
                problems.push(format!("{}: {}", name, e));
                continue;
            }

            if let Err(e) = write_tags(&encoded, track, cover.as_ref()) {
                log::warn!("Cannot tag {}: {}", encoded.display(), e);
            }

            let report = quality::validate(
                self.prober.as_ref(),
                &self.policy,
                &encoded,
                Some(track.duration_ms),
            )
            .await;

            let candidate = Candidate {
                source: name.clone(),
                path: encoded,
                report,
            };

            if candidate.report.verdict.is_accepted() {
                return self.keep(track, paths, candidate, TrackStatus::Success).await;
            }

            log::warn!(
                "Validation failed for audio from {}: {}. Trying next source if available.",
                name,
                candidate.report.verdict.reasons()
            );
            problems.push(format!("{}: {}", name, candidate.report.verdict.reasons()));

            if best.as_ref().is_none_or(|current| candidate.beats(current)) {
                best = Some(candidate);
            }
        }

        if let Some(candidate) = best {
            return self.keep(track, paths, candidate, TrackStatus::Degraded).await;
        }

        let message = if !self.sources.is_empty() && unavailable == self.sources.len() {
            format!("Not available on any source ({})", problems.join("; "))
        } else {
            problems.join("; ")
        };

        Ok(DownloadResult::failed(track.clone(), message))
    }

    async fn keep(
        &self,
        track: &Track,
        paths: &TrackPaths,
        candidate: Candidate,
        status: TrackStatus,
    ) -> Result<DownloadResult> {
        if candidate.path == paths.target {
            log::info!(
                "Keeping existing file {}, no source did better",
                paths.target.display()
            );
            return Ok(DownloadResult {
                track: track.clone(),
                status,
                path: Some(paths.target.clone()),
                source: Some(candidate.source),
                bitrate_kbps: candidate.report.bitrate_kbps(),
                message: format!(
                    "Kept existing file ({})",
                    candidate.report.verdict.reasons()
                ),
            });
        }

        if async_fs::metadata(&paths.target).await.is_ok() {
            async_fs::remove_file(&paths.target).await?;
        }
        async_fs::rename(&candidate.path, &paths.target).await?;

        let bitrate_kbps = candidate.report.bitrate_kbps();
        let metadata = TrackMetadata {
            track: track.clone(),
            download_source: candidate.source.clone(),
            bitrate_kbps,
        };
        match serde_json::to_string_pretty(&metadata) {
            Ok(json) => match async_fs::write(&paths.sidecar, json).await {
                Ok(_) => log::info!("Saved metadata to: {}", paths.sidecar.display()),
                Err(e) => log::error!(
                    "Failed to save metadata {}: {}",
                    paths.sidecar.display(),
                    e
                ),
            },
            Err(e) => log::error!("Failed to serialize metadata for {}: {}", track, e),
        }

        let message = match status {
            TrackStatus::Success => format!("Saved to {}", paths.target.display()),
            _ => format!(
                "Kept best file ({})",
                candidate.report.verdict.reasons()
            ),
        };

        Ok(DownloadResult {
            track: track.clone(),
            status,
            path: Some(paths.target.clone()),
            source: Some(candidate.source),
            bitrate_kbps,
            message,
        })
    }

    async fn fetch_cover_art(&self, track: &Track) -> Option<CoverArt> {
        let client = self.http.as_ref()?;
        let url = track.cover_art_url.as_deref()?;

        let response = client
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Failed to download cover art for {}: {}", track, e);
                return None;
            }
        };

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or("image/jpeg")
            .to_string();

        match response.bytes().await {
            Ok(bytes) => Some(CoverArt {
                mime_type,
                data: bytes.to_vec(),
            }),
            Err(e) => {
                log::warn!("Failed to read cover art for {}: {}", track, e);
                None
            }
        }
    }
}

/// Reads the `download_source` of a sidecar file.
///
/// Unreadable or corrupt sidecars are ignored.
pub async fn read_sidecar_source(path: &Path) -> Option<String> {
    let content = match async_fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            log::debug!("Could not read metadata {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(json) => json["download_source"].as_str().map(str::to_string),
        Err(e) => {
            log::debug!("Could not parse metadata {}: {}", path.display(), e);
            None
        }
    }
}

async fn recreate_dir(dir: &Path) -> std::io::Result<()> {
    if async_fs::metadata(dir).await.is_ok() {
        async_fs::remove_dir_all(dir).await?;
    }
    async_fs::create_dir_all(dir).await
}

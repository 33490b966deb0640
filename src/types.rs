use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTracksPage {
    pub items: Vec<PlaylistItem>,
    pub next: Option<String>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<SpotifyTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTrack {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<SpotifyArtist>,
    pub duration_ms: Option<u64>,
    pub track_number: Option<u32>,
    pub album: Option<SpotifyAlbum>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub is_local: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyArtist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyAlbum {
    pub name: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
}

/// A playlist entry with everything needed to find, tag and validate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_ms: u64,
    pub track_number: Option<u32>,
    pub year: Option<String>,
    pub cover_art_url: Option<String>,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

#[derive(Debug, Clone)]
pub struct Playlist {
    pub id: String,
    pub tracks: Vec<Track>,
}

/// What the downloader writes next to every MP3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMetadata {
    #[serde(flatten)]
    pub track: Track,
    pub download_source: String,
    pub bitrate_kbps: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    Success,
    Degraded,
    Failed,
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackStatus::Success => write!(f, "Success"),
            TrackStatus::Degraded => write!(f, "Degraded"),
            TrackStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub track: Track,
    pub status: TrackStatus,
    pub path: Option<PathBuf>,
    pub source: Option<String>,
    pub bitrate_kbps: Option<u32>,
    pub message: String,
}

impl DownloadResult {
    pub fn failed(track: Track, message: impl Into<String>) -> Self {
        Self {
            track,
            status: TrackStatus::Failed,
            path: None,
            source: None,
            bitrate_kbps: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub degraded: usize,
    pub failed: usize,
}

impl Summary {
    pub fn add(&mut self, status: TrackStatus) {
        match status {
            TrackStatus::Success => self.succeeded += 1,
            TrackStatus::Degraded => self.degraded += 1,
            TrackStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.degraded + self.failed
    }
}

#[derive(Tabled)]
pub struct SummaryTableRow {
    pub status: String,
    pub track: String,
    pub artist: String,
    pub source: String,
    pub details: String,
}

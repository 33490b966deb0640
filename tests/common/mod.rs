#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use spotrip::{
    Error, Result,
    download::{AudioSource, Encoder, TrackDownloader},
    quality::{AudioProbe, Prober, QualityPolicy},
    types::Track,
};

pub const DURATION_MS: u64 = 200_000;

pub fn track(artist: &str, title: &str) -> Track {
    Track {
        id: None,
        title: title.to_string(),
        artist: artist.to_string(),
        album: Some("Album".to_string()),
        duration_ms: DURATION_MS,
        track_number: Some(1),
        year: Some("2001".to_string()),
        cover_art_url: None,
    }
}

/// A fresh directory under the system temp dir.
pub fn scratch_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("spotrip-{}-{}", prefix, rand::random::<u64>()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// File content understood by [`FakeProber`].
pub fn audio_content(kbps: u32) -> String {
    format!("fake audio bitrate={};", kbps)
}

/// Serves a file of the given bitrate, or nothing at all.
pub struct FakeSource {
    pub name: &'static str,
    pub kbps: Option<u32>,
    /// Titles this source has nothing for.
    pub missing: Vec<&'static str>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn new(name: &'static str, kbps: Option<u32>) -> Self {
        Self {
            name,
            kbps,
            missing: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn missing(mut self, title: &'static str) -> Self {
        self.missing.push(title);
        self
    }
}

#[async_trait]
impl AudioSource for FakeSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch(&self, track: &Track, workdir: &Path) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let kbps = match self.kbps {
            Some(kbps) if !self.missing.iter().any(|m| *m == track.title) => kbps,
            _ => return Err(Error::NotAvailable(format!("no results on {}", self.name))),
        };

        let path = workdir.join("raw.webm");
        std::fs::write(&path, audio_content(kbps))?;
        Ok(path)
    }
}

/// Copies the input, failing for inputs below `fail_below_kbps`.
pub struct CopyEncoder {
    pub fail_below_kbps: u32,
}

#[async_trait]
impl Encoder for CopyEncoder {
    async fn encode(&self, input: &Path, output: &Path) -> Result<()> {
        let content = std::fs::read_to_string(input)?;
        if bitrate_of(&content).unwrap_or(0) < self.fail_below_kbps {
            return Err(Error::tool("ffmpeg", "Invalid data found when processing input"));
        }
        std::fs::copy(input, output)?;
        Ok(())
    }
}

/// Reads the bitrate marker written by [`FakeSource`]. ID3 tags written in
/// front of it are skipped.
pub struct FakeProber;

#[async_trait]
impl Prober for FakeProber {
    async fn probe(&self, path: &Path) -> Result<AudioProbe> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let kbps = bitrate_of(&content).ok_or_else(|| Error::tool("ffprobe", "invalid data"))?;

        Ok(AudioProbe {
            format_name: "mp3".to_string(),
            bit_rate_bps: u64::from(kbps) * 1000,
            duration_ms: Some(DURATION_MS),
        })
    }
}

fn bitrate_of(content: &str) -> Option<u32> {
    let start = content.find("bitrate=")? + "bitrate=".len();
    let end = start + content[start..].find(';')?;
    content[start..end].parse().ok()
}

pub fn downloader(sources: Vec<FakeSource>) -> TrackDownloader {
    TrackDownloader::new(
        sources
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn AudioSource>)
            .collect(),
        Box::new(CopyEncoder { fail_below_kbps: 0 }),
        Box::new(FakeProber),
        QualityPolicy::new(320),
    )
    .without_cover_art()
}

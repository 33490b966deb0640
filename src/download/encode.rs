use std::path::Path;

use async_trait::async_trait;
use id3::{Tag, TagLike, Version, frame::Picture, frame::PictureType};
use tokio::process::Command;

use super::Encoder;
use crate::{
    config,
    error::{Error, Result},
    types::Track,
};

/// Encodes to MP3 with ffmpeg's LAME encoder at a constant bitrate.
pub struct FfmpegEncoder {
    bin: String,
    bitrate: String,
}

impl FfmpegEncoder {
    pub fn new(bin: impl Into<String>, bitrate: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            bitrate: bitrate.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(config::ffmpeg_bin(), config::audio_bitrate())
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(&self, input: &Path, output: &Path) -> Result<()> {
        log::info!(
            "Converting {} to MP3 at {}",
            input.display(),
            self.bitrate
        );

        let result = Command::new(&self.bin)
            .args(["-nostdin", "-loglevel", "error", "-y", "-i"])
            .arg(input)
            .args([
                "-vn",
                "-map_metadata",
                "-1",
                "-codec:a",
                "libmp3lame",
                "-b:a",
                self.bitrate.as_str(),
            ])
            .arg(output)
            .output()
            .await;

        let failure = match result {
            Ok(out) if out.status.success() => return Ok(()),
            Ok(out) => String::from_utf8_lossy(&out.stderr).trim().to_string(),
            Err(e) => e.to_string(),
        };

        if async_fs::remove_file(output).await.is_ok() {
            log::debug!("Removed partial output {}", output.display());
        }
        Err(Error::tool(&self.bin, failure))
    }
}

/// Cover image bytes as served by the Spotify CDN.
#[derive(Debug, Clone)]
pub struct CoverArt {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Builds the ID3 tag for a track.
pub fn build_tag(track: &Track, cover: Option<&CoverArt>) -> Tag {
    let mut tag = Tag::new();
    tag.set_title(&track.title);
    tag.set_artist(&track.artist);

    if let Some(album) = &track.album {
        tag.set_album(album);
    }
    if let Some(number) = track.track_number {
        tag.set_track(number);
    }
    if let Some(year) = track.year.as_deref().and_then(|y| y.parse::<i32>().ok()) {
        tag.set_year(year);
    }
    if let Some(cover) = cover {
        tag.add_frame(Picture {
            mime_type: cover.mime_type.clone(),
            picture_type: PictureType::CoverFront,
            description: "Cover".to_string(),
            data: cover.data.clone(),
        });
    }

    tag
}

pub fn write_tags(path: &Path, track: &Track, cover: Option<&CoverArt>) -> Result<()> {
    build_tag(track, cover).write_to_path(path, Version::Id3v24)?;
    Ok(())
}

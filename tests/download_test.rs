mod common;

use std::sync::atomic::Ordering;

use common::*;
use spotrip::{
    download::{AudioSource, TrackDownloader, TrackPaths},
    quality::QualityPolicy,
    types::{TrackMetadata, TrackStatus},
};

#[tokio::test]
async fn test_first_source_success() {
    let folder = scratch_dir("dl-success");
    let track = track("Daft Punk", "One More Time");
    let downloader = downloader(vec![
        FakeSource::new("SoundCloud", Some(320)),
        FakeSource::new("YouTube", Some(320)),
    ]);

    let result = downloader.download(&track, &folder).await;
    let paths = TrackPaths::new(&track, &folder);

    assert_eq!(result.status, TrackStatus::Success);
    assert_eq!(result.source.as_deref(), Some("SoundCloud"));
    assert_eq!(result.bitrate_kbps, Some(320));
    assert_eq!(result.path.as_deref(), Some(paths.target.as_path()));
    assert!(paths.target.is_file());
    assert!(paths.target.ends_with("Daft_Punk_-_One_More_Time.mp3"));
    // scratch directory is gone
    assert!(!paths.scratch.exists());

    let sidecar = std::fs::read_to_string(&paths.sidecar).unwrap();
    let metadata: TrackMetadata = serde_json::from_str(&sidecar).unwrap();
    assert_eq!(metadata.download_source, "SoundCloud");
    assert_eq!(metadata.track, track);

    std::fs::remove_dir_all(&folder).unwrap();
}

#[tokio::test]
async fn test_falls_back_to_second_source() {
    let folder = scratch_dir("dl-fallback");
    let track = track("Daft Punk", "Digital Love");
    let downloader = downloader(vec![
        FakeSource::new("SoundCloud", None),
        FakeSource::new("YouTube", Some(320)),
    ]);

    let result = downloader.download(&track, &folder).await;

    assert_eq!(result.status, TrackStatus::Success);
    assert_eq!(result.source.as_deref(), Some("YouTube"));

    std::fs::remove_dir_all(&folder).unwrap();
}

#[tokio::test]
async fn test_low_bitrate_keeps_best_degraded_file() {
    let folder = scratch_dir("dl-degraded");
    let track = track("Daft Punk", "Aerodynamic");
    let downloader = downloader(vec![
        FakeSource::new("SoundCloud", Some(128)),
        FakeSource::new("YouTube", Some(192)),
    ]);

    let result = downloader.download(&track, &folder).await;
    let paths = TrackPaths::new(&track, &folder);

    assert_eq!(result.status, TrackStatus::Degraded);
    assert_eq!(result.source.as_deref(), Some("YouTube"));
    assert_eq!(result.bitrate_kbps, Some(192));
    assert!(result.message.contains("192 kbps"));
    assert!(paths.target.is_file());
    assert!(!paths.scratch.exists());

    std::fs::remove_dir_all(&folder).unwrap();
}

#[tokio::test]
async fn test_unavailable_everywhere_fails() {
    let folder = scratch_dir("dl-failed");
    let track = track("Nobody", "Unreleased Demo");
    let downloader = downloader(vec![
        FakeSource::new("SoundCloud", None),
        FakeSource::new("YouTube", None),
    ]);

    let result = downloader.download(&track, &folder).await;
    let paths = TrackPaths::new(&track, &folder);

    assert_eq!(result.status, TrackStatus::Failed);
    assert!(result.path.is_none());
    assert!(result.message.contains("Not available"));
    assert!(!paths.target.exists());
    assert!(!paths.scratch.exists());

    std::fs::remove_dir_all(&folder).unwrap();
}

#[tokio::test]
async fn test_encoder_failure_tries_next_source() {
    let folder = scratch_dir("dl-encode");
    let track = track("Daft Punk", "Voyager");
    let downloader = TrackDownloader::new(
        vec![
            Box::new(FakeSource::new("SoundCloud", Some(160))) as Box<dyn AudioSource>,
            Box::new(FakeSource::new("YouTube", Some(320))),
        ],
        Box::new(CopyEncoder {
            fail_below_kbps: 200,
        }),
        Box::new(FakeProber),
        QualityPolicy::new(320),
    )
    .without_cover_art();

    let result = downloader.download(&track, &folder).await;

    assert_eq!(result.status, TrackStatus::Success);
    assert_eq!(result.source.as_deref(), Some("YouTube"));

    std::fs::remove_dir_all(&folder).unwrap();
}

#[tokio::test]
async fn test_existing_valid_file_is_skipped() {
    let folder = scratch_dir("dl-existing");
    let track = track("Daft Punk", "Harder Better Faster Stronger");
    let paths = TrackPaths::new(&track, &folder);
    std::fs::write(&paths.target, audio_content(320)).unwrap();
    std::fs::write(&paths.sidecar, r#"{"download_source": "YouTube"}"#).unwrap();

    let source = FakeSource::new("SoundCloud", Some(320));
    let calls = source.calls.clone();
    let downloader = downloader(vec![source]);

    let result = downloader.download(&track, &folder).await;

    assert_eq!(result.status, TrackStatus::Success);
    assert_eq!(result.source.as_deref(), Some("YouTube"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    std::fs::remove_dir_all(&folder).unwrap();
}

#[tokio::test]
async fn test_existing_file_without_sidecar() {
    let folder = scratch_dir("dl-existing-bare");
    let track = track("Daft Punk", "Crescendolls");
    let paths = TrackPaths::new(&track, &folder);
    std::fs::write(&paths.target, audio_content(320)).unwrap();

    let result = downloader(vec![FakeSource::new("SoundCloud", Some(320))])
        .download(&track, &folder)
        .await;

    assert_eq!(result.status, TrackStatus::Success);
    assert_eq!(result.source.as_deref(), Some("Unknown/Existing"));

    std::fs::remove_dir_all(&folder).unwrap();
}

#[tokio::test]
async fn test_existing_invalid_file_is_replaced() {
    let folder = scratch_dir("dl-replace");
    let track = track("Daft Punk", "Too Long");
    let paths = TrackPaths::new(&track, &folder);
    std::fs::write(&paths.target, audio_content(96)).unwrap();

    let source = FakeSource::new("SoundCloud", Some(320));
    let calls = source.calls.clone();
    let result = downloader(vec![source]).download(&track, &folder).await;

    assert_eq!(result.status, TrackStatus::Success);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let content = String::from_utf8_lossy(&std::fs::read(&paths.target).unwrap()).to_string();
    assert!(content.contains("bitrate=320;"));

    std::fs::remove_dir_all(&folder).unwrap();
}

#[test]
fn test_track_paths_fall_back_for_unusable_names() {
    let folder = std::path::Path::new("out");
    let mut track = track("???", "***");
    track.id = Some("4uLU6hMCjMI75M1A2tKUQC".to_string());

    let paths = TrackPaths::new(&track, folder);
    // " - " survives sanitizing as "-"
    assert_eq!(paths.target, folder.join("-.mp3"));
    assert_eq!(paths.scratch, folder.join("_temp_dl_4uLU6hMCjMI75M1A2tKUQC"));
}

#[tokio::test]
async fn test_rerun_without_sources_keeps_degraded_file() {
    let folder = scratch_dir("dl-rerun");
    let track = track("Daft Punk", "Something About Us");
    let paths = TrackPaths::new(&track, &folder);

    let first = downloader(vec![FakeSource::new("YouTube", Some(192))])
        .download(&track, &folder)
        .await;
    assert_eq!(first.status, TrackStatus::Degraded);

    let second = downloader(vec![
        FakeSource::new("SoundCloud", None),
        FakeSource::new("YouTube", None),
    ])
    .download(&track, &folder)
    .await;

    assert_eq!(second.status, TrackStatus::Degraded);
    assert_eq!(second.source.as_deref(), Some("YouTube"));
    assert_eq!(second.bitrate_kbps, Some(192));
    assert!(paths.target.is_file());
    assert!(paths.sidecar.is_file());

    std::fs::remove_dir_all(&folder).unwrap();
}

#[tokio::test]
async fn test_worse_download_does_not_replace_existing_file() {
    let folder = scratch_dir("dl-worse");
    let track = track("Daft Punk", "Face To Face");
    let paths = TrackPaths::new(&track, &folder);
    std::fs::write(&paths.target, audio_content(192)).unwrap();

    let result = downloader(vec![FakeSource::new("SoundCloud", Some(128))])
        .download(&track, &folder)
        .await;

    assert_eq!(result.status, TrackStatus::Degraded);
    assert_eq!(result.bitrate_kbps, Some(192));
    assert_eq!(result.source.as_deref(), Some("Unknown/Existing"));
    let content = String::from_utf8_lossy(&std::fs::read(&paths.target).unwrap()).to_string();
    assert!(content.contains("bitrate=192;"));

    std::fs::remove_dir_all(&folder).unwrap();
}

#[tokio::test]
async fn test_better_degraded_download_replaces_existing_file() {
    let folder = scratch_dir("dl-better");
    let track = track("Daft Punk", "Short Circuit");
    let paths = TrackPaths::new(&track, &folder);
    std::fs::write(&paths.target, audio_content(128)).unwrap();
    std::fs::write(&paths.sidecar, r#"{"download_source": "SoundCloud"}"#).unwrap();

    let result = downloader(vec![FakeSource::new("YouTube", Some(256))])
        .download(&track, &folder)
        .await;

    assert_eq!(result.status, TrackStatus::Degraded);
    assert_eq!(result.source.as_deref(), Some("YouTube"));
    assert_eq!(result.bitrate_kbps, Some(256));

    let sidecar = std::fs::read_to_string(&paths.sidecar).unwrap();
    let metadata: TrackMetadata = serde_json::from_str(&sidecar).unwrap();
    assert_eq!(metadata.download_source, "YouTube");

    std::fs::remove_dir_all(&folder).unwrap();
}

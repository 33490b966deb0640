use std::{io::IsTerminal, path::PathBuf};

use crate::{
    config,
    download::TrackDownloader,
    error, info, pipeline,
    report::Reporter,
    spotify::{self, Endpoints, auth::Credentials},
    success, utils, warning,
};

pub const EXIT_OK: i32 = 0;
pub const EXIT_TRACKS_FAILED: i32 = 2;

/// Downloads every track of a playlist into `folder`.
///
/// Returns the process exit status. Fatal errors exit directly.
pub async fn download(playlist_url: String, folder: Option<String>) -> i32 {
    for message in config::validate_settings(&config::Settings::from_env()) {
        log::warn!("{}", message);
        warning!("{}", message);
    }

    let credentials = match Credentials::from_env() {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            error!("{}", e);
        }
    };

    info!("Fetching track list from playlist {}", playlist_url);
    let endpoints = Endpoints::from_env();
    let playlist = match spotify::resolve_playlist(&playlist_url, credentials, &endpoints).await {
        Ok(p) => p,
        Err(e) => {
            log::error!("Cannot resolve playlist {}: {}", playlist_url, e);
            error!("Cannot resolve playlist. Err: {}", e);
        }
    };

    if playlist.tracks.is_empty() {
        log::warn!("Playlist {} has no downloadable tracks", playlist.id);
        warning!("No tracks found in playlist {}.", playlist.id);
        return EXIT_OK;
    }
    success!(
        "Found {} tracks in playlist {}",
        playlist.tracks.len(),
        playlist.id
    );

    let folder = PathBuf::from(folder.unwrap_or_else(config::download_dir));
    if let Err(e) = utils::ensure_dir_exists(&folder).await {
        error!(
            "Cannot create download folder {}. Err: {}",
            folder.display(),
            e
        );
    }

    let downloader = TrackDownloader::from_env();
    let mut reporter =
        Reporter::for_output(std::io::stdout().is_terminal(), playlist.tracks.len());
    pipeline::process_tracks(&playlist.tracks, &folder, &downloader, &mut reporter).await;
    let summary = reporter.finish(&folder);

    exit_status(summary.failed)
}

fn exit_status(failed: usize) -> i32 {
    if failed > 0 {
        EXIT_TRACKS_FAILED
    } else {
        EXIT_OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(0), EXIT_OK);
        assert_eq!(exit_status(3), EXIT_TRACKS_FAILED);
    }
}

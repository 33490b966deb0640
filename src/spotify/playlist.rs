use std::time::Duration;

use reqwest::{StatusCode, header::HeaderMap};
use tokio::time::sleep;
use url::Url;

use crate::{
    error::{Error, Result},
    management::TokenManager,
    types::{ApiErrorResponse, Playlist, PlaylistTracksPage, SpotifyTrack, Track},
};

const PAGE_LIMIT: u32 = 100;
const MAX_RETRY_AFTER_SECS: u64 = 120;
const MAX_BAD_GATEWAY_RETRIES: u32 = 3;
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Extracts the playlist id from a Spotify link.
///
/// Accepted forms:
/// - `https://open.spotify.com/playlist/<id>?si=...`
/// - `https://open.spotify.com/intl-de/playlist/<id>`
/// - `open.spotify.com/playlist/<id>`
/// - `spotify:playlist:<id>`
/// - a bare `<id>`
pub fn parse_playlist_id(link: &str) -> Result<String> {
    let link = link.trim();
    let invalid = || Error::InvalidPlaylistUrl(link.to_string());

    let candidate = if let Some(id) = link.strip_prefix("spotify:playlist:") {
        id.to_string()
    } else if link.contains('/') {
        let with_scheme = if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            format!("https://{}", link)
        };

        let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
        match url.host_str() {
            Some("open.spotify.com") | Some("play.spotify.com") => {}
            _ => return Err(invalid()),
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        segments
            .iter()
            .position(|seg| *seg == "playlist")
            .and_then(|pos| segments.get(pos + 1))
            .map(|id| id.to_string())
            .ok_or_else(invalid)?
    } else {
        link.to_string()
    };

    if is_spotify_id(&candidate) {
        Ok(candidate)
    } else {
        Err(invalid())
    }
}

fn is_spotify_id(id: &str) -> bool {
    id.len() == 22 && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Retrieves every track of a playlist, in playlist order.
///
/// Follows the `next` links of the paging object until the last page. Entries
/// that cannot be downloaded (local files, removed tracks, podcast episodes)
/// are skipped.
pub async fn get_playlist_tracks(
    token_mgr: &mut TokenManager,
    api_url: &str,
    playlist_id: &str,
) -> Result<Playlist> {
    let mut next = Some(format!(
        "{uri}/playlists/{id}/tracks?limit={limit}&additional_types=track",
        uri = api_url.trim_end_matches('/'),
        id = playlist_id,
        limit = PAGE_LIMIT
    ));

    let mut tracks: Vec<Track> = Vec::new();
    let mut skipped = 0;

    while let Some(page_url) = next {
        let page = get_page(token_mgr, &page_url, playlist_id).await?;
        log::debug!(
            "Fetched page with {} items (total {:?})",
            page.items.len(),
            page.total
        );

        for item in page.items {
            match item.track.and_then(into_track) {
                Some(track) => tracks.push(track),
                None => skipped += 1,
            }
        }

        next = page.next;
    }

    if skipped > 0 {
        log::info!("Skipped {} playlist entries without usable track data", skipped);
    }
    log::info!("Fetched {} tracks from playlist {}", tracks.len(), playlist_id);

    Ok(Playlist {
        id: playlist_id.to_string(),
        tracks,
    })
}

async fn get_page(
    token_mgr: &mut TokenManager,
    page_url: &str,
    playlist_id: &str,
) -> Result<PlaylistTracksPage> {
    let mut bad_gateway_retries = 0;
    let mut rate_limit_retries = 0;

    loop {
        let token = token_mgr.get_valid_token().await?;
        let response = token_mgr
            .client()
            .get(page_url)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<PlaylistTracksPage>().await?);
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = retry_after_secs(response.headers()).max(1);
                if retry_after > MAX_RETRY_AFTER_SECS {
                    return Err(Error::Spotify {
                        status,
                        message: format!(
                            "rate limited for {} seconds, try again later",
                            retry_after
                        ),
                    });
                }
                if rate_limit_retries >= MAX_RATE_LIMIT_RETRIES {
                    return Err(Error::Spotify {
                        status,
                        message: format!(
                            "still rate limited after {} retries, try again later",
                            rate_limit_retries
                        ),
                    });
                }
                rate_limit_retries += 1;
                log::warn!(
                    "Rate limited, retry {} in {}s",
                    rate_limit_retries,
                    retry_after
                );
                sleep(Duration::from_secs(retry_after)).await;
            }
            StatusCode::BAD_GATEWAY if bad_gateway_retries < MAX_BAD_GATEWAY_RETRIES => {
                bad_gateway_retries += 1;
                log::warn!("Bad gateway from Spotify, retry {}", bad_gateway_retries);
                sleep(Duration::from_secs(10)).await;
            }
            _ => {
                let message = match response.json::<ApiErrorResponse>().await {
                    Ok(body) => body.error.message.unwrap_or_default(),
                    Err(_) => String::new(),
                };
                return Err(status_error(status, message, playlist_id));
            }
        }
    }
}

/// Maps an unsuccessful playlist response onto the error tiers.
pub fn status_error(status: StatusCode, message: String, playlist_id: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::Auth(if message.is_empty() {
            "access token rejected".to_string()
        } else {
            message
        }),
        StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Error::PlaylistNotFound(format!(
            "{} ({})",
            playlist_id,
            if message.is_empty() {
                status.to_string()
            } else {
                message
            }
        )),
        _ => Error::Spotify { status, message },
    }
}

/// Reads the `Retry-After` header, defaulting to one second.
pub fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(1)
}

/// Converts an API track into a [`Track`], or `None` when it can't be downloaded.
pub fn into_track(track: SpotifyTrack) -> Option<Track> {
    if track.is_local || track.kind.as_deref().is_some_and(|k| k != "track") {
        return None;
    }

    let title = track.name.filter(|n| !n.trim().is_empty())?;
    let duration_ms = track.duration_ms.filter(|d| *d > 0)?;
    if track.artists.is_empty() {
        return None;
    }

    let artist = track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let album = track.album.as_ref();

    Some(Track {
        id: track.id,
        title,
        artist,
        album: album.and_then(|a| a.name.clone()),
        duration_ms,
        track_number: track.track_number,
        year: album
            .and_then(|a| a.release_date.as_deref())
            .and_then(|d| d.split('-').next())
            .filter(|y| !y.is_empty())
            .map(str::to_string),
        cover_art_url: album
            .and_then(|a| a.images.first())
            .map(|i| i.url.clone()),
    })
}

//! # Spotify Integration Module
//!
//! This module is the Playlist Resolver: it turns a playlist link into the
//! ordered list of tracks to download.
//!
//! ## Flow
//!
//! ```text
//! playlist link ──parse_playlist_id──▶ playlist id
//! credentials   ──request_token──────▶ app access token (client credentials grant)
//! id + token    ──get_playlist_tracks─▶ Playlist { tracks }
//! ```
//!
//! ## Modules
//!
//! - [`auth`] - Credentials from the environment and the client credentials grant.
//!   No user login is involved, so only public (or shared) playlists resolve.
//! - [`playlist`] - Link parsing, paginated `GET /playlists/{id}/tracks` and the
//!   conversion from API objects into [`crate::types::Track`].
//!
//! ## Error Handling
//!
//! Everything here runs before the first download, and every error is fatal:
//! - **Missing or rejected credentials** - [`crate::Error::Auth`]
//! - **Malformed link** - [`crate::Error::InvalidPlaylistUrl`]
//! - **Private or unknown playlist** - [`crate::Error::PlaylistNotFound`]
//!
//! Rate limits (429) are honoured through the `Retry-After` header for delays of
//! up to 120 seconds, and 502 Bad Gateway responses are retried after 10 seconds.

pub mod auth;
pub mod playlist;

use reqwest::Client;

use crate::{config, error::Result, management::TokenManager, types::Playlist};

/// Where the Web API and the token endpoint live.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub api_url: String,
    pub token_url: String,
}

impl Endpoints {
    /// `SPOTIFY_API_URL` and `SPOTIFY_API_TOKEN_URL`, or the public Spotify endpoints.
    pub fn from_env() -> Self {
        Self {
            api_url: config::spotify_apiurl(),
            token_url: config::spotify_apitoken_url(),
        }
    }
}

/// Resolves a playlist link with the given credentials.
///
/// Validates the link before any network traffic so that a typo fails fast.
pub async fn resolve_playlist(
    link: &str,
    credentials: auth::Credentials,
    endpoints: &Endpoints,
) -> Result<Playlist> {
    let playlist_id = playlist::parse_playlist_id(link)?;
    let mut token_mgr =
        TokenManager::authenticate(Client::new(), &endpoints.token_url, credentials).await?;
    playlist::get_playlist_tracks(&mut token_mgr, &endpoints.api_url, &playlist_id).await
}

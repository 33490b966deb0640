use chrono::Utc;
use reqwest::{Client, StatusCode};

use crate::{
    config,
    error::{Error, Result},
    types::{Token, TokenErrorResponse, TokenResponse},
};

/// Client id and secret of a Spotify application.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Reads `SPOTIPY_CLIENT_ID` and `SPOTIPY_CLIENT_SECRET` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from any variable lookup.
    ///
    /// Missing and blank values are both rejected, so a run without credentials
    /// stops here before any request or download is attempted.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&str> = [config::CLIENT_ID_VAR, config::CLIENT_SECRET_VAR]
            .into_iter()
            .filter(|name| read(name).is_none())
            .collect();

        if !missing.is_empty() {
            return Err(Error::Auth(format!(
                "missing credentials ({}). Set them in the environment or a .env file.",
                missing.join(", ")
            )));
        }

        Ok(Self {
            client_id: read(config::CLIENT_ID_VAR).unwrap_or_default(),
            client_secret: read(config::CLIENT_SECRET_VAR).unwrap_or_default(),
        })
    }
}

/// Requests an app access token from `token_url` with the client credentials grant.
///
/// Spotify answers rejected credentials with 400 `invalid_client` (or 401),
/// both become [`Error::Auth`].
pub async fn request_token(
    client: &Client,
    token_url: &str,
    credentials: &Credentials,
) -> Result<Token> {
    let res = client
        .post(token_url)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await?;

    let status = res.status();
    if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
        let reason = match res.json::<TokenErrorResponse>().await {
            Ok(body) => body.error_description.unwrap_or(body.error),
            Err(_) => status.to_string(),
        };
        return Err(Error::Auth(format!("credentials rejected: {}", reason)));
    }

    if !status.is_success() {
        let message = res.text().await.unwrap_or_default();
        return Err(Error::Spotify { status, message });
    }

    let json = res.json::<TokenResponse>().await?;
    log::debug!(
        "Obtained {} token valid for {}s",
        json.token_type.as_deref().unwrap_or("Bearer"),
        json.expires_in.unwrap_or(3600)
    );

    Ok(Token {
        access_token: json.access_token,
        expires_in: json.expires_in.unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    })
}

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Spotify authentication failed: {0}")]
    Auth(String),

    #[error("Not a Spotify playlist link: {0}")]
    InvalidPlaylistUrl(String),

    #[error("Playlist not found or not accessible: {0}")]
    PlaylistNotFound(String),

    #[error("No download source available: {0}")]
    NotAvailable(String),

    #[error("Spotify API returned {status}: {message}")]
    Spotify { status: StatusCode, message: String },

    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tagging error: {0}")]
    Tag(#[from] id3::Error),
}

impl Error {
    pub fn tool(tool: &str, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

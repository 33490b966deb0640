use chrono::Utc;
use reqwest::Client;

use crate::{
    error::Result,
    spotify::auth::{Credentials, request_token},
    types::Token,
};

/// Keeps the app access token for the duration of one run.
///
/// Client credential tokens have no refresh token, so an expiring token is
/// simply requested again. Nothing is written to disk.
pub struct TokenManager {
    client: Client,
    token_url: String,
    credentials: Credentials,
    token: Token,
}

impl TokenManager {
    /// Authenticates once and returns a manager holding the fresh token.
    pub async fn authenticate(
        client: Client,
        token_url: &str,
        credentials: Credentials,
    ) -> Result<Self> {
        let token = request_token(&client, token_url, &credentials).await?;
        Ok(Self::new(client, token_url, credentials, token))
    }

    pub fn new(client: Client, token_url: &str, credentials: Credentials, token: Token) -> Self {
        TokenManager {
            client,
            token_url: token_url.to_string(),
            credentials,
            token,
        }
    }

    pub async fn get_valid_token(&mut self) -> Result<String> {
        if self.is_expired() {
            log::info!("Access token about to expire, requesting a new one");
            self.token = request_token(&self.client, &self.token_url, &self.credentials).await?;
        }

        Ok(self.token.access_token.clone())
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        now + 240 >= self.token.obtained_at + self.token.expires_in
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }
}

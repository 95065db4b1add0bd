use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::error::TraktError;
use crate::http::TraktHttp;

const AUTHORIZE_URL: &str = "https://trakt.tv/oauth/authorize";
const TOKEN_PATH: &str = "/oauth/token";
const STATE_LEN: usize = 32;

/// Authorization URL for the browser redirect, plus the opaque state token
/// embedded in it. The caller keeps the state and compares it against the
/// one returned with the authorization code.
#[derive(Debug, Clone)]
pub struct AuthUrl {
    pub url: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
}

/// OAuth authorization-code flow against Trakt.
pub struct TraktAuth {
    http: Arc<TraktHttp>,
}

impl TraktAuth {
    pub fn new(http: Arc<TraktHttp>) -> Self {
        Self { http }
    }

    /// Build the authorization URL the user opens in a browser.
    pub fn authorize_url(&self) -> Result<AuthUrl, TraktError> {
        let config = self.http.config();
        if !config.has_client_id() {
            return Err(TraktError::Configuration(
                "Trakt client id is not configured".to_string(),
            ));
        }

        let state = random_state(STATE_LEN);
        let url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&state={}",
            AUTHORIZE_URL,
            config.client_id,
            urlencoding::encode(&config.redirect_uri),
            state
        );
        Ok(AuthUrl { url, state })
    }

    /// Exchange an authorization code for a token pair and persist it.
    ///
    /// The `state` returned alongside the code is accepted here so callers
    /// have one place to hand it over, but matching it against the issued
    /// value is the caller's responsibility; this flow does not track issued
    /// states. Nothing is written to the token store unless the exchange
    /// and the response decode both succeed.
    pub async fn exchange_code(&self, code: &str, _state: &str) -> Result<(), TraktError> {
        let config = self.http.config();
        if !config.has_client_id() || !config.has_client_secret() {
            return Err(TraktError::Configuration(
                "Trakt client id and secret are required for the code exchange".to_string(),
            ));
        }

        let payload = serde_json::json!({
            "code": code,
            "client_id": config.client_id,
            "client_secret": config.client_secret,
            "redirect_uri": config.redirect_uri,
            "grant_type": "authorization_code"
        });

        let body = self.http.post_json(TOKEN_PATH, &payload).await?;
        let token: TokenResponse = serde_json::from_str(&body)?;

        self.http
            .tokens()
            .store_token(&token.access_token, &token.refresh_token, token.expires_in)
            .await?;
        info!("Trakt account connected");
        Ok(())
    }

    /// Drop the stored token pair.
    pub async fn disconnect(&self) -> Result<(), TraktError> {
        self.http.tokens().clear().await?;
        info!("Trakt account disconnected");
        Ok(())
    }
}

fn random_state(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use watchlog_config::TraktConfig;

use crate::error::TraktError;
use crate::limiter::RequestPacer;
use crate::store::TokenStore;

pub const API_BASE: &str = "https://api.trakt.tv";
const API_VERSION: &str = "2";
const USER_AGENT: &str = concat!("watchlog/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Fixed backoff before the single retry after a 429.
const THROTTLE_BACKOFF: Duration = Duration::from_secs(2);

/// A response body plus the page count Trakt reports for paginated
/// endpoints (1 when the header is absent).
pub struct PageResponse {
    pub body: String,
    pub total_pages: u32,
}

/// Authenticated access to the Trakt REST API.
///
/// Every call goes through the shared [`RequestPacer`]; GETs resolve the
/// bearer token from the [`TokenStore`] and fail before any network I/O when
/// configuration or authentication is missing.
pub struct TraktHttp {
    http: Client,
    base_url: String,
    config: TraktConfig,
    tokens: Arc<TokenStore>,
    pacer: Arc<RequestPacer>,
}

impl TraktHttp {
    pub fn new(config: TraktConfig, tokens: Arc<TokenStore>, pacer: Arc<RequestPacer>) -> Self {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: API_BASE.to_string(),
            config,
            tokens,
            pacer,
        }
    }

    /// Point the gateway at a different host. Used by tests against a local
    /// mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn config(&self) -> &TraktConfig {
        &self.config
    }

    pub async fn get(&self, path: &str) -> Result<String, TraktError> {
        self.get_paged(path).await.map(|page| page.body)
    }

    /// Authenticated GET. 401 clears the stored token and reports an
    /// authentication error; 429 backs off once for a fixed two seconds and
    /// retries exactly once.
    pub async fn get_paged(&self, path: &str) -> Result<PageResponse, TraktError> {
        if !self.config.has_client_id() {
            return Err(TraktError::Configuration(
                "Trakt client id is not configured".to_string(),
            ));
        }
        let token = self.tokens.access_token().await?.ok_or_else(|| {
            TraktError::Authentication("no valid Trakt token; connect first".to_string())
        })?;

        let url = format!("{}{}", self.base_url, path);
        let mut throttled = false;

        loop {
            self.pacer.wait_for_slot().await;

            let response = self
                .http
                .get(&url)
                .header("Authorization", format!("Bearer {}", token))
                .header("trakt-api-version", API_VERSION)
                .header("trakt-api-key", &self.config.client_id)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let total_pages: u32 = response
                    .headers()
                    .get("X-Pagination-Page-Count")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1);
                let body = response.text().await?;
                debug!(%url, total_pages, "Trakt GET ok");
                return Ok(PageResponse { body, total_pages });
            }

            if status == StatusCode::UNAUTHORIZED {
                self.tokens.clear().await?;
                return Err(TraktError::Authentication(
                    "Trakt session expired; reconnect required".to_string(),
                ));
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if throttled {
                    return Err(TraktError::RateLimited);
                }
                throttled = true;
                warn!(%url, "Trakt throttled the request, backing off for one retry");
                tokio::time::sleep(THROTTLE_BACKOFF).await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(TraktError::Api {
                status: status.as_u16(),
                body,
            });
        }
    }

    /// Unauthenticated JSON POST, used by the OAuth code exchange. Attaches
    /// the API key header when configured but never a bearer token.
    pub async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<String, TraktError> {
        let url = format!("{}{}", self.base_url, path);
        self.pacer.wait_for_slot().await;

        let mut request = self
            .http
            .post(&url)
            .json(body)
            .header("trakt-api-version", API_VERSION)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        if self.config.has_client_id() {
            request = request.header("trakt-api-key", &self.config.client_id);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TraktError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}

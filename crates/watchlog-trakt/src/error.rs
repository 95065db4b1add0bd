use thiserror::Error;

/// Failure taxonomy for the Trakt import engine.
///
/// Every failure is surfaced as a value; nothing in this crate panics on
/// provider behavior. Callers retry at their own level, typically by
/// re-running the OAuth flow on `Authentication`.
#[derive(Debug, Error)]
pub enum TraktError {
    /// Client id / secret missing from configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No valid token, or Trakt answered 401.
    #[error("authentication required: {0}")]
    Authentication(String),

    /// Trakt kept answering 429 through the single retry.
    #[error("rate limited by Trakt, retry exhausted")]
    RateLimited,

    /// Any other non-2xx answer.
    #[error("Trakt API error: status {status}: {body}")]
    Api { status: u16, body: String },

    /// Transport-level failure (connect, TLS, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The response envelope could not be decoded at all.
    #[error("failed to decode Trakt response: {0}")]
    Parse(String),

    /// The persistence collaborator failed.
    #[error("credential storage error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for TraktError {
    fn from(err: reqwest::Error) -> Self {
        TraktError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TraktError {
    fn from(err: serde_json::Error) -> Self {
        TraktError::Parse(err.to_string())
    }
}

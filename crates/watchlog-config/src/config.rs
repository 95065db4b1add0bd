use serde::{Deserialize, Serialize};

/// Out-of-band redirect used when no redirect URI is configured. The
/// provider then displays the authorization code for manual entry.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

const CLIENT_ID_VAR: &str = "WATCHLOG_TRAKT_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "WATCHLOG_TRAKT_CLIENT_SECRET";
const REDIRECT_URI_VAR: &str = "WATCHLOG_TRAKT_REDIRECT_URI";

/// Trakt application credentials, sourced from the environment.
///
/// An unset client id or secret is carried as an empty string; the engine
/// reports a configuration error at the call that actually needs the value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl TraktConfig {
    pub fn from_env() -> Self {
        Self {
            client_id: std::env::var(CLIENT_ID_VAR).unwrap_or_default(),
            client_secret: std::env::var(CLIENT_SECRET_VAR).unwrap_or_default(),
            redirect_uri: std::env::var(REDIRECT_URI_VAR)
                .unwrap_or_else(|_| OOB_REDIRECT_URI.to_string()),
        }
    }

    pub fn has_client_id(&self) -> bool {
        !self.client_id.is_empty()
    }

    pub fn has_client_secret(&self) -> bool {
        !self.client_secret.is_empty()
    }
}

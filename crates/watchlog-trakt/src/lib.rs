pub mod aggregate;
pub mod auth;
pub mod error;
pub mod history;
pub mod http;
pub mod importer;
pub mod limiter;
pub mod store;
pub mod wire;

pub use aggregate::{group_episode_history, EpisodeWatchEvent, SyncMode};
pub use auth::{AuthUrl, TraktAuth};
pub use error::TraktError;
pub use history::HistoryClient;
pub use http::TraktHttp;
pub use importer::{ImportBatch, TraktImporter};
pub use limiter::RequestPacer;
pub use store::{CredentialSyncStore, StoredSettings, SyncStore, Token, TokenStore};

pub mod connect;
pub mod disconnect;
pub mod status;
pub mod sync;

use std::sync::Arc;

use color_eyre::eyre::Context;
use watchlog_config::{PathManager, TraktConfig};
use watchlog_trakt::{
    CredentialSyncStore, HistoryClient, RequestPacer, TokenStore, TraktAuth, TraktHttp,
    TraktImporter,
};

/// The wired-up import engine shared by every command.
pub struct Engine {
    pub http: Arc<TraktHttp>,
    pub store: Arc<CredentialSyncStore>,
}

pub fn build_engine() -> color_eyre::Result<Engine> {
    let paths = PathManager::default();
    paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let store = Arc::new(
        CredentialSyncStore::open(paths.credentials_file())
            .wrap_err("failed to open the credential store")?,
    );
    let tokens = Arc::new(TokenStore::new(store.clone()));
    let config = TraktConfig::from_env();
    let http = Arc::new(TraktHttp::new(config, tokens, Arc::new(RequestPacer::new())));

    Ok(Engine { http, store })
}

impl Engine {
    pub fn auth(&self) -> TraktAuth {
        TraktAuth::new(self.http.clone())
    }

    pub fn importer(&self) -> TraktImporter {
        TraktImporter::new(HistoryClient::new(self.http.clone()), self.store.clone())
    }
}

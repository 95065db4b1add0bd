use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use watchlog_models::{HistoryItem, MediaType, RatingBucket, WatchedSeries};

use crate::aggregate::SyncMode;
use crate::error::TraktError;
use crate::history::HistoryClient;
use crate::store::SyncStore;

/// Everything one import run produced, ready for the caller to upsert into
/// the local library.
#[derive(Debug)]
pub struct ImportBatch {
    pub movies: Vec<HistoryItem>,
    pub shows: Vec<WatchedSeries>,
    pub watchlist: Vec<HistoryItem>,
    pub ratings: HashMap<(u64, MediaType), u8>,
    /// Mode the batch was actually fetched with; an incremental request
    /// without a stored cursor falls back to a full run.
    pub mode: SyncMode,
}

impl ImportBatch {
    /// The stored rating mapped onto the internal five-bucket scale.
    pub fn rating_bucket(&self, tmdb_id: u64, media_type: MediaType) -> Option<RatingBucket> {
        self.ratings
            .get(&(tmdb_id, media_type))
            .copied()
            .map(RatingBucket::from_score)
    }
}

/// Runs one import: reads the sync cursor, fetches history, ratings and
/// watchlist, attaches ratings, and advances the cursor only after every
/// fetch succeeded.
pub struct TraktImporter {
    history: HistoryClient,
    store: Arc<dyn SyncStore>,
}

impl TraktImporter {
    pub fn new(history: HistoryClient, store: Arc<dyn SyncStore>) -> Self {
        Self { history, store }
    }

    pub async fn import(&self, mode: SyncMode) -> Result<ImportBatch, TraktError> {
        let since = match mode {
            SyncMode::Full => None,
            SyncMode::Incremental => {
                let cursor = self.store.settings()?.last_sync_at;
                if cursor.is_none() {
                    info!("no sync cursor stored, falling back to a full import");
                }
                cursor
            }
        };

        let (mut movies, mut shows) = match since {
            Some(since) => (
                self.history.watched_movies_since(since).await?,
                self.history.watched_shows_with_episodes_since(since).await?,
            ),
            None => (
                self.history.watched_movies().await?,
                self.history.watched_shows_with_episodes().await?,
            ),
        };
        let ratings = self.history.ratings().await?;
        let watchlist = self.history.watchlist().await?;

        for movie in &mut movies {
            movie.rating = ratings.get(&(movie.tmdb_id, MediaType::Movie)).copied();
        }
        for show in &mut shows {
            show.rating = ratings.get(&(show.tmdb_id, MediaType::Show)).copied();
        }

        self.store.update_last_sync(Utc::now())?;

        let mode = if since.is_some() {
            SyncMode::Incremental
        } else {
            SyncMode::Full
        };
        info!(
            movies = movies.len(),
            shows = shows.len(),
            watchlist = watchlist.len(),
            ratings = ratings.len(),
            ?mode,
            "Trakt import finished"
        );

        Ok(ImportBatch {
            movies,
            shows,
            watchlist,
            ratings,
            mode,
        })
    }
}

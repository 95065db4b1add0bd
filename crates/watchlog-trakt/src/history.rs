use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use watchlog_models::{HistoryItem, MediaType, WatchedSeries};

use crate::aggregate::{group_episode_history, EpisodeWatchEvent, SyncMode};
use crate::error::TraktError;
use crate::http::TraktHttp;
use crate::wire::{
    self, WireHistoryEntry, WireRatingEntry, WireWatchedShow, WireWatchlistEntry,
};

const PAGE_LIMIT: u32 = 100;

/// Fetches the user's watch history, ratings and watchlist from Trakt.
pub struct HistoryClient {
    http: Arc<TraktHttp>,
}

impl HistoryClient {
    pub fn new(http: Arc<TraktHttp>) -> Self {
        Self { http }
    }

    /// Full movie history.
    pub async fn watched_movies(&self) -> Result<Vec<HistoryItem>, TraktError> {
        self.fetch_watched_movies(None).await
    }

    /// Movie history filtered to watches at or after `since`.
    pub async fn watched_movies_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryItem>, TraktError> {
        self.fetch_watched_movies(Some(since)).await
    }

    async fn fetch_watched_movies(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<HistoryItem>, TraktError> {
        let entries = self.fetch_history_pages("/sync/history/movies", since).await?;
        let total = entries.len();
        let items: Vec<HistoryItem> = entries
            .into_iter()
            .filter_map(WireHistoryEntry::into_movie_item)
            .collect();
        debug!(
            fetched = total,
            kept = items.len(),
            "parsed Trakt movie history"
        );
        Ok(items)
    }

    /// Aggregate watched shows: one item per show carrying only the
    /// last-watched timestamp. Used when episode detail is unnecessary.
    pub async fn watched_shows(&self) -> Result<Vec<HistoryItem>, TraktError> {
        let body = self.http.get("/sync/watched/shows").await?;
        let entries: Vec<WireWatchedShow> = wire::parse_array(&body)?;
        let total = entries.len();
        let items: Vec<HistoryItem> = entries
            .into_iter()
            .filter_map(WireWatchedShow::into_show_item)
            .collect();
        debug!(
            fetched = total,
            kept = items.len(),
            "parsed Trakt watched shows"
        );
        Ok(items)
    }

    /// Full episode-level show history, grouped by show with duplicate
    /// watches collapsed to the earliest timestamp.
    pub async fn watched_shows_with_episodes(&self) -> Result<Vec<WatchedSeries>, TraktError> {
        let events = self.fetch_episode_events(None).await?;
        Ok(group_episode_history(events, SyncMode::Full))
    }

    /// Episode-level show history since `since`, duplicates preserved for
    /// the caller to reconcile against stored state.
    pub async fn watched_shows_with_episodes_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<WatchedSeries>, TraktError> {
        let events = self.fetch_episode_events(Some(since)).await?;
        Ok(group_episode_history(events, SyncMode::Incremental))
    }

    /// The show *history* endpoint is used here rather than the aggregate
    /// one: only the history endpoint carries a timestamp per individual
    /// episode watch.
    async fn fetch_episode_events(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<EpisodeWatchEvent>, TraktError> {
        let entries = self.fetch_history_pages("/sync/history/shows", since).await?;
        let total = entries.len();
        let events: Vec<EpisodeWatchEvent> = entries
            .into_iter()
            .filter_map(WireHistoryEntry::into_episode_event)
            .collect();
        debug!(
            fetched = total,
            kept = events.len(),
            "parsed Trakt episode history"
        );
        Ok(events)
    }

    /// All ratings, keyed by `(tmdb_id, media_type)`. When Trakt emits more
    /// than one rating for the same key the last one parsed wins.
    pub async fn ratings(&self) -> Result<HashMap<(u64, MediaType), u8>, TraktError> {
        let mut ratings = HashMap::new();
        let mut page = 1;
        loop {
            let path = format!("/sync/ratings?page={}&limit={}", page, PAGE_LIMIT);
            let response = self.http.get_paged(&path).await?;
            let entries: Vec<WireRatingEntry> = wire::parse_array(&response.body)?;
            for (key, rating) in entries.into_iter().filter_map(WireRatingEntry::into_rating) {
                ratings.insert(key, rating);
            }
            if page >= response.total_pages {
                break;
            }
            page += 1;
        }
        debug!(count = ratings.len(), "parsed Trakt ratings");
        Ok(ratings)
    }

    /// The user's watchlist; each element's declared type selects the
    /// movie or show parser.
    pub async fn watchlist(&self) -> Result<Vec<HistoryItem>, TraktError> {
        let body = self.http.get("/sync/watchlist").await?;
        let entries: Vec<WireWatchlistEntry> = wire::parse_array(&body)?;
        let total = entries.len();
        let items: Vec<HistoryItem> = entries
            .into_iter()
            .filter_map(WireWatchlistEntry::into_item)
            .collect();
        debug!(
            fetched = total,
            kept = items.len(),
            "parsed Trakt watchlist"
        );
        Ok(items)
    }

    async fn fetch_history_pages(
        &self,
        path: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<WireHistoryEntry>, TraktError> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let mut url = format!("{}?page={}&limit={}", path, page, PAGE_LIMIT);
            if let Some(since) = since {
                url.push_str(&format!(
                    "&start_at={}",
                    urlencoding::encode(&since.to_rfc3339())
                ));
            }
            let response = self.http.get_paged(&url).await?;
            let entries: Vec<WireHistoryEntry> = wire::parse_array(&response.body)?;
            all.extend(entries);
            if page >= response.total_pages {
                break;
            }
            page += 1;
        }
        Ok(all)
    }
}

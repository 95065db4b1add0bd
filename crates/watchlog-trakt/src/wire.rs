use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use watchlog_models::{HistoryItem, MediaType};

use crate::aggregate::EpisodeWatchEvent;
use crate::error::TraktError;

/// Wire-format records for the Trakt JSON envelope.
///
/// Every per-item field is optional: a record missing the piece we need
/// (usually the TMDB id) converts to `None` and is dropped from the batch,
/// while a body that fails to decode as the expected array fails the whole
/// call.

#[derive(Debug, Clone, Deserialize)]
pub struct WireIds {
    pub trakt: Option<u64>,
    pub tmdb: Option<u64>,
    pub imdb: Option<String>,
    pub tvdb: Option<u64>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMovie {
    pub title: Option<String>,
    pub year: Option<u32>,
    pub ids: Option<WireIds>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireShow {
    pub title: Option<String>,
    pub year: Option<u32>,
    pub ids: Option<WireIds>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireEpisode {
    pub season: Option<u32>,
    pub number: Option<u32>,
    pub title: Option<String>,
    pub ids: Option<WireIds>,
}

/// One element of `/sync/history/...` (movie or episode watch event).
#[derive(Debug, Deserialize)]
pub struct WireHistoryEntry {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub watched_at: Option<String>,
    pub movie: Option<WireMovie>,
    pub show: Option<WireShow>,
    pub episode: Option<WireEpisode>,
}

/// One element of `/sync/watched/shows` (aggregate, no episode detail).
#[derive(Debug, Deserialize)]
pub struct WireWatchedShow {
    pub plays: Option<u32>,
    pub last_watched_at: Option<String>,
    pub show: Option<WireShow>,
}

/// One element of `/sync/ratings`.
#[derive(Debug, Deserialize)]
pub struct WireRatingEntry {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub rating: Option<u8>,
    pub rated_at: Option<String>,
    pub movie: Option<WireMovie>,
    pub show: Option<WireShow>,
}

/// One element of `/sync/watchlist`.
#[derive(Debug, Deserialize)]
pub struct WireWatchlistEntry {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub listed_at: Option<String>,
    pub movie: Option<WireMovie>,
    pub show: Option<WireShow>,
}

/// Decode a whole response body as an array of `T`. Structural breakage
/// here fails the entire call.
pub fn parse_array<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, TraktError> {
    serde_json::from_str(body).map_err(|e| TraktError::Parse(e.to_string()))
}

/// RFC 3339 timestamp, or `None` when the field is absent or malformed.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn tmdb_id(ids: &Option<WireIds>) -> Option<u64> {
    ids.as_ref().and_then(|ids| ids.tmdb)
}

impl WireHistoryEntry {
    /// A movie watch event, or `None` when the TMDB id is missing.
    pub fn into_movie_item(self) -> Option<HistoryItem> {
        let movie = self.movie?;
        let tmdb_id = tmdb_id(&movie.ids)?;
        Some(HistoryItem {
            tmdb_id,
            media_type: MediaType::Movie,
            title: movie.title.unwrap_or_default(),
            watched_at: parse_timestamp(self.watched_at.as_deref()),
            rating: None,
        })
    }

    /// An episode watch event, or `None` when the show's TMDB id or the
    /// episode coordinates are missing.
    pub fn into_episode_event(self) -> Option<EpisodeWatchEvent> {
        let show = self.show?;
        let episode = self.episode?;
        let show_tmdb_id = tmdb_id(&show.ids)?;
        Some(EpisodeWatchEvent {
            show_tmdb_id,
            show_title: show.title.unwrap_or_default(),
            season: episode.season?,
            number: episode.number?,
            watched_at: parse_timestamp(self.watched_at.as_deref()),
        })
    }
}

impl WireWatchedShow {
    /// A show-level history item, or `None` when the TMDB id is missing.
    pub fn into_show_item(self) -> Option<HistoryItem> {
        let show = self.show?;
        let tmdb_id = tmdb_id(&show.ids)?;
        Some(HistoryItem {
            tmdb_id,
            media_type: MediaType::Show,
            title: show.title.unwrap_or_default(),
            watched_at: parse_timestamp(self.last_watched_at.as_deref()),
            rating: None,
        })
    }
}

impl WireRatingEntry {
    /// The rating keyed the way the local catalog matches it, or `None`
    /// when the record is not a rateable movie/show with a TMDB id.
    pub fn into_rating(self) -> Option<((u64, MediaType), u8)> {
        let rating = self.rating?;
        match self.kind.as_deref() {
            Some("movie") => {
                let id = tmdb_id(&self.movie?.ids)?;
                Some(((id, MediaType::Movie), rating))
            }
            Some("show") => {
                let id = tmdb_id(&self.show?.ids)?;
                Some(((id, MediaType::Show), rating))
            }
            _ => None,
        }
    }
}

impl WireWatchlistEntry {
    /// The watchlisted movie or show, or `None` for other kinds or a
    /// missing TMDB id.
    pub fn into_item(self) -> Option<HistoryItem> {
        match self.kind.as_deref() {
            Some("movie") => {
                let movie = self.movie?;
                let id = tmdb_id(&movie.ids)?;
                Some(HistoryItem {
                    tmdb_id: id,
                    media_type: MediaType::Movie,
                    title: movie.title.unwrap_or_default(),
                    watched_at: None,
                    rating: None,
                })
            }
            Some("show") => {
                let show = self.show?;
                let id = tmdb_id(&show.ids)?;
                Some(HistoryItem {
                    tmdb_id: id,
                    media_type: MediaType::Show,
                    title: show.title.unwrap_or_default(),
                    watched_at: None,
                    rating: None,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_entry_without_tmdb_id_is_dropped() {
        let body = r#"[
            {"type":"movie","watched_at":"2024-01-02T03:04:05Z",
             "movie":{"title":"Heat","year":1995,"ids":{"trakt":1,"tmdb":949,"imdb":"tt0113277","tvdb":null,"slug":"heat-1995"}}},
            {"type":"movie","watched_at":"2024-01-03T00:00:00Z",
             "movie":{"title":"Unknown","year":null,"ids":{"trakt":2,"tmdb":null,"imdb":null,"tvdb":null,"slug":null}}}
        ]"#;

        let entries: Vec<WireHistoryEntry> = parse_array(body).unwrap();
        let items: Vec<_> = entries
            .into_iter()
            .filter_map(WireHistoryEntry::into_movie_item)
            .collect();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].tmdb_id, 949);
        assert_eq!(items[0].title, "Heat");
        assert!(items[0].watched_at.is_some());
    }

    #[test]
    fn test_malformed_envelope_fails_the_call() {
        let err = parse_array::<WireHistoryEntry>("{\"not\":\"an array\"}").unwrap_err();
        assert!(matches!(err, TraktError::Parse(_)));
    }

    #[test]
    fn test_bad_timestamp_becomes_none() {
        let body = r#"[
            {"type":"movie","watched_at":"yesterday-ish",
             "movie":{"title":"Heat","year":1995,"ids":{"trakt":1,"tmdb":949,"imdb":null,"tvdb":null,"slug":null}}}
        ]"#;

        let entries: Vec<WireHistoryEntry> = parse_array(body).unwrap();
        let item = entries
            .into_iter()
            .filter_map(WireHistoryEntry::into_movie_item)
            .next()
            .unwrap();
        assert_eq!(item.watched_at, None);
    }

    #[test]
    fn test_episode_event_requires_show_id_and_coordinates() {
        let body = r#"[
            {"type":"episode","watched_at":"2024-02-01T20:00:00Z",
             "show":{"title":"Severance","year":2022,"ids":{"trakt":1,"tmdb":95396,"imdb":null,"tvdb":null,"slug":null}},
             "episode":{"season":1,"number":2,"title":"Half Loop","ids":{"trakt":10,"tmdb":null,"imdb":null,"tvdb":null,"slug":null}}},
            {"type":"episode","watched_at":"2024-02-02T20:00:00Z",
             "show":{"title":"Severance","year":2022,"ids":{"trakt":1,"tmdb":95396,"imdb":null,"tvdb":null,"slug":null}},
             "episode":{"season":null,"number":3,"title":null,"ids":null}}
        ]"#;

        let entries: Vec<WireHistoryEntry> = parse_array(body).unwrap();
        let events: Vec<_> = entries
            .into_iter()
            .filter_map(WireHistoryEntry::into_episode_event)
            .collect();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].show_tmdb_id, 95396);
        assert_eq!((events[0].season, events[0].number), (1, 2));
    }

    #[test]
    fn test_rating_entry_keyed_by_id_and_type() {
        let body = r#"[
            {"type":"movie","rating":9,"rated_at":"2024-01-01T00:00:00Z",
             "movie":{"title":"Heat","year":1995,"ids":{"trakt":1,"tmdb":949,"imdb":null,"tvdb":null,"slug":null}}},
            {"type":"show","rating":7,"rated_at":"2024-01-01T00:00:00Z",
             "show":{"title":"Severance","year":2022,"ids":{"trakt":2,"tmdb":95396,"imdb":null,"tvdb":null,"slug":null}}},
            {"type":"episode","rating":5,"rated_at":"2024-01-01T00:00:00Z"}
        ]"#;

        let entries: Vec<WireRatingEntry> = parse_array(body).unwrap();
        let ratings: Vec<_> = entries
            .into_iter()
            .filter_map(WireRatingEntry::into_rating)
            .collect();

        assert_eq!(ratings.len(), 2);
        assert!(ratings.contains(&((949, MediaType::Movie), 9)));
        assert!(ratings.contains(&((95396, MediaType::Show), 7)));
    }

    #[test]
    fn test_watchlist_entry_selects_parser_by_kind() {
        let body = r#"[
            {"type":"movie","listed_at":"2024-03-01T00:00:00Z",
             "movie":{"title":"Dune","year":2021,"ids":{"trakt":1,"tmdb":438631,"imdb":null,"tvdb":null,"slug":null}}},
            {"type":"show","listed_at":"2024-03-02T00:00:00Z",
             "show":{"title":"Dark","year":2017,"ids":{"trakt":2,"tmdb":70523,"imdb":null,"tvdb":null,"slug":null}}},
            {"type":"season","listed_at":"2024-03-03T00:00:00Z"}
        ]"#;

        let entries: Vec<WireWatchlistEntry> = parse_array(body).unwrap();
        let items: Vec<_> = entries
            .into_iter()
            .filter_map(WireWatchlistEntry::into_item)
            .collect();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].media_type, MediaType::Movie);
        assert_eq!(items[1].media_type, MediaType::Show);
    }
}

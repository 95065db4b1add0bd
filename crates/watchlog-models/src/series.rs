use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded watch of one episode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeWatch {
    pub season: u32,
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<DateTime<Utc>>,
}

/// A show together with its watched episodes, grouped from the flat
/// per-episode history stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedSeries {
    pub tmdb_id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_watched_at: Option<DateTime<Utc>>,
    pub episodes: Vec<EpisodeWatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>, // Provider scale (1-10 integer)
}

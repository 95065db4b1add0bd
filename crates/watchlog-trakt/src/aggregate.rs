use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use watchlog_models::{EpisodeWatch, WatchedSeries};

/// Whether a batch covers the whole history or only events since the stored
/// cursor. Incremental batches keep duplicate watches verbatim so the caller
/// can reconcile rewatches against already-persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Full,
    Incremental,
}

/// One per-episode watch event from the flat history stream.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeWatchEvent {
    pub show_tmdb_id: u64,
    pub show_title: String,
    pub season: u32,
    pub number: u32,
    pub watched_at: Option<DateTime<Utc>>,
}

/// Group flat per-episode watch events by show.
///
/// Per group: the title comes from the first event encountered,
/// `last_watched_at` is the maximum timestamp present. In full mode each
/// `(season, number)` pair keeps a single watch with the earliest timestamp
/// among duplicates; in incremental mode every event is emitted unchanged,
/// in input order.
pub fn group_episode_history(events: Vec<EpisodeWatchEvent>, mode: SyncMode) -> Vec<WatchedSeries> {
    let mut order: Vec<u64> = Vec::new();
    let mut groups: HashMap<u64, Vec<EpisodeWatchEvent>> = HashMap::new();

    for event in events {
        let group = groups.entry(event.show_tmdb_id).or_default();
        if group.is_empty() {
            order.push(event.show_tmdb_id);
        }
        group.push(event);
    }

    order
        .into_iter()
        .filter_map(|id| groups.remove(&id))
        .map(|group| build_series(group, mode))
        .collect()
}

fn build_series(group: Vec<EpisodeWatchEvent>, mode: SyncMode) -> WatchedSeries {
    let tmdb_id = group[0].show_tmdb_id;
    let title = group[0].show_title.clone();
    let last_watched_at = group.iter().filter_map(|event| event.watched_at).max();

    let episodes = match mode {
        SyncMode::Incremental => group
            .into_iter()
            .map(|event| EpisodeWatch {
                season: event.season,
                number: event.number,
                watched_at: event.watched_at,
            })
            .collect(),
        SyncMode::Full => {
            let mut earliest: BTreeMap<(u32, u32), Option<DateTime<Utc>>> = BTreeMap::new();
            for event in group {
                let slot = earliest
                    .entry((event.season, event.number))
                    .or_insert(event.watched_at);
                *slot = match (*slot, event.watched_at) {
                    (Some(existing), Some(candidate)) => Some(existing.min(candidate)),
                    (Some(existing), None) => Some(existing),
                    (None, candidate) => candidate,
                };
            }
            earliest
                .into_iter()
                .map(|((season, number), watched_at)| EpisodeWatch {
                    season,
                    number,
                    watched_at,
                })
                .collect()
        }
    };

    WatchedSeries {
        tmdb_id,
        title,
        last_watched_at,
        episodes,
        rating: None,
    }
}

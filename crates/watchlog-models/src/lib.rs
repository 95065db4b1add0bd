pub mod history;
pub mod media;
pub mod rating;
pub mod series;

pub use history::HistoryItem;
pub use media::MediaType;
pub use rating::RatingBucket;
pub use series::{EpisodeWatch, WatchedSeries};

use std::collections::BTreeMap;

use watchlog_models::RatingBucket;
use watchlog_trakt::SyncMode;

use super::build_engine;

pub async fn run_sync(full: bool) -> color_eyre::Result<()> {
    let engine = build_engine()?;
    let importer = engine.importer();

    let mode = if full {
        SyncMode::Full
    } else {
        SyncMode::Incremental
    };
    let batch = importer.import(mode).await?;

    println!(
        "Imported {} movies, {} shows, {} watchlist entries, {} ratings ({:?} sync).",
        batch.movies.len(),
        batch.shows.len(),
        batch.watchlist.len(),
        batch.ratings.len(),
        batch.mode
    );

    let mut buckets: BTreeMap<RatingBucket, usize> = BTreeMap::new();
    for (id, media_type) in batch.ratings.keys() {
        if let Some(bucket) = batch.rating_bucket(*id, *media_type) {
            *buckets.entry(bucket).or_default() += 1;
        }
    }
    if !buckets.is_empty() {
        println!("Ratings by bucket:");
        for (bucket, count) in buckets.iter().rev() {
            println!("  {:?}: {}", bucket, count);
        }
    }

    Ok(())
}

use watchlog_trakt::SyncStore;

use super::build_engine;

pub async fn run_status() -> color_eyre::Result<()> {
    let engine = build_engine()?;

    let connected = engine.http.tokens().is_authenticated().await?;
    let settings = engine.store.settings()?;

    println!(
        "Connected to Trakt: {}",
        if connected { "yes" } else { "no" }
    );
    if let Some(expires_at) = settings.expires_at {
        println!("Token expires at: {}", expires_at);
    }
    match settings.last_sync_at {
        Some(at) => println!("Last sync: {}", at),
        None => println!("Last sync: never"),
    }

    Ok(())
}

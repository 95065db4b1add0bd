use super::build_engine;

pub async fn run_disconnect() -> color_eyre::Result<()> {
    let engine = build_engine()?;
    engine.auth().disconnect().await?;

    println!("Trakt account disconnected; stored tokens removed.");
    Ok(())
}

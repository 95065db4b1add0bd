use color_eyre::eyre::eyre;
use std::io::{self, Write};

use super::build_engine;

pub async fn run_connect() -> color_eyre::Result<()> {
    let engine = build_engine()?;
    let auth = engine.auth();
    let issued = auth.authorize_url()?;

    println!("\nPlease visit the following URL to authorize this application:");
    println!("{}\n", issued.url);

    print!("Please enter the authorization code from the URL: ");
    io::stdout().flush()?;

    let mut code = String::new();
    io::stdin().read_line(&mut code)?;
    let code = code.trim();

    if code.is_empty() {
        return Err(eyre!("Authorization code cannot be empty"));
    }

    // The out-of-band flow hands the code back directly, so the issued
    // state comes straight back with it.
    auth.exchange_code(code, &issued.state).await?;

    println!("Trakt account connected.");
    Ok(())
}

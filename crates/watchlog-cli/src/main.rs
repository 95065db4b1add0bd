use clap::{ArgAction, Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "watchlog")]
#[command(about = "Watchlog - import your Trakt watch history into the local library")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect a Trakt account
    #[command(long_about = "Run the Trakt OAuth authorization-code flow. Prints the authorization URL, then prompts for the code Trakt displays after you approve the application. Requires WATCHLOG_TRAKT_CLIENT_ID and WATCHLOG_TRAKT_CLIENT_SECRET.")]
    Connect,

    /// Import watch history, ratings and watchlist from Trakt
    #[command(long_about = "Fetch watched movies, episode-level show history, ratings and the watchlist from Trakt. By default only events since the last sync are fetched; use --full to re-import everything.")]
    Sync {
        /// Force a full import, ignoring the stored sync cursor
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Show connection and sync status
    Status,

    /// Forget the stored Trakt tokens
    Disconnect,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    match cli.command {
        Commands::Connect => commands::connect::run_connect().await,
        Commands::Sync { full } => commands::sync::run_sync(full).await,
        Commands::Status => commands::status::run_status().await,
        Commands::Disconnect => commands::disconnect::run_disconnect().await,
    }
}

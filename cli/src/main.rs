use clap::Parser;
use config::ConfigError;
use playlist_sync::config::SyncConfig;
use playlist_sync::napster::NapsterClient;
use playlist_sync::spotify::{SpotifyAuthorizer, SpotifyClient};
use playlist_sync::sync::run_sync;
use std::error::Error;
use std::process::ExitCode;

#[derive(Parser, Debug, Default)]
#[command(name = "playlist-sync")]
#[command(about = "Import favorited Napster tracks into a Spotify playlist")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Spotify API client ID
    #[arg(long)]
    spotify_api_client_id: Option<String>,

    /// Spotify API secret key
    #[arg(long)]
    spotify_api_secret_key: Option<String>,

    /// Napster API key
    #[arg(long)]
    napster_api_key: Option<String>,

    /// Napster secret key
    #[arg(long)]
    napster_secret_key: Option<String>,

    /// Napster username
    #[arg(long)]
    napster_username: Option<String>,

    /// Napster password
    #[arg(long)]
    napster_password: Option<String>,

    /// Spotify playlist name
    #[arg(short, long)]
    playlist_name: Option<String>,

    /// Only import favorites by these artists (can be given multiple times)
    #[arg(short = 'a', long = "only-artists", num_args = 1..)]
    only_artists: Vec<String>,

    /// Two-letter market used to filter Spotify albums (e.g. "US")
    #[arg(short = 'm', long)]
    spotify_album_market: Option<String>,

    /// Resolve tracks but don't modify the playlist
    #[arg(short = 'n', long)]
    no_changes: bool,
}

/// Load configuration from args with optional config file override
fn load_config_from_args(args: &Args) -> Result<SyncConfig, ConfigError> {
    let config = if let Some(config_path) = &args.config {
        SyncConfig::load_with_file(Some(config_path))?
    } else {
        SyncConfig::load()?
    };

    Ok(merge_args_into_config(config, args))
}

/// Merge command line arguments into the configuration
fn merge_args_into_config(mut config: SyncConfig, args: &Args) -> SyncConfig {
    let overrides = [
        (&args.spotify_api_client_id, &mut config.spotify.client_id),
        (&args.spotify_api_secret_key, &mut config.spotify.client_secret),
        (&args.napster_api_key, &mut config.napster.api_key),
        (&args.napster_secret_key, &mut config.napster.secret_key),
        (&args.napster_username, &mut config.napster.username),
        (&args.napster_password, &mut config.napster.password),
        (&args.playlist_name, &mut config.sync.playlist_name),
    ];
    for (arg, field) in overrides {
        if let Some(value) = arg {
            *field = value.clone();
        }
    }

    if !args.only_artists.is_empty() {
        config.sync.artists = args.only_artists.clone();
    }
    if let Some(market) = &args.spotify_album_market {
        config.spotify.market = Some(market.clone());
    }
    if args.no_changes {
        config.sync.dry_run = true;
    }

    config
}

async fn run(config: SyncConfig) -> Result<(), Box<dyn Error>> {
    let options = config.to_sync_options();

    let token = SpotifyAuthorizer::from_config(&config.spotify)
        .authorize()
        .await?;
    let spotify = SpotifyClient::from_config(&config.spotify, token.access_token);

    let napster = NapsterClient::from_config(&config.napster).await?;

    let outcome = run_sync(&napster, &spotify, &options).await?;
    log::info!(
        "Done: ({}) added, ({}) albums skipped, ({}) not found.",
        if outcome.applied { outcome.report.added() } else { 0 },
        outcome.report.skipped,
        outcome.report.missing()
    );

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            // --help and --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    let config = match load_config_from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = config.validate() {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Sync failed: {e}");
            ExitCode::FAILURE
        }
    }
}

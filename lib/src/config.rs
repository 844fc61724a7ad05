use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SyncError;
use crate::importer::{ImportOptions, FAVORITES_PAGE_SIZE};
use crate::playlist::{ADD_BATCH_SIZE, PLAYLIST_PAGE_SIZE};
use crate::resolver::{ResolverOptions, ALBUM_PAGE_SIZE};
use crate::sync::SyncOptions;

pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com";
pub const DEFAULT_SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_NAPSTER_API_URL: &str = "https://api.napster.com";
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:8888/authResponse";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8888";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    pub spotify: SpotifyConfig,
    pub napster: NapsterConfig,
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Must be registered with the Spotify application
    pub redirect_url: String,
    /// Where the authorization callback server listens
    pub bind_address: String,
    /// Two-letter market code used to filter album listings
    pub market: Option<String>,
    pub api_base_url: String,
    pub accounts_base_url: String,
    /// Retry rate-limited requests after the advertised delay
    pub auto_retry: bool,
    pub max_retries: u32,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            market: None,
            api_base_url: DEFAULT_SPOTIFY_API_URL.to_string(),
            accounts_base_url: DEFAULT_SPOTIFY_ACCOUNTS_URL.to_string(),
            auto_retry: true,
            max_retries: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NapsterConfig {
    pub api_key: String,
    pub secret_key: String,
    pub username: String,
    pub password: String,
    pub api_base_url: String,
}

impl Default for NapsterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            secret_key: String::new(),
            username: String::new(),
            password: String::new(),
            api_base_url: DEFAULT_NAPSTER_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncSettings {
    /// Name of the destination playlist
    pub playlist_name: String,
    /// Artists whose favorites are imported
    pub artists: Vec<String>,
    /// Dry run mode - resolve but don't modify the playlist
    pub dry_run: bool,
    pub favorites_page_size: u32,
    pub add_batch_size: usize,
    pub album_page_size: u32,
    pub playlist_page_size: u32,
    /// Give up on an artist search after this many pages
    pub max_artist_pages: Option<usize>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            playlist_name: String::new(),
            artists: Vec::new(),
            dry_run: false,
            favorites_page_size: FAVORITES_PAGE_SIZE,
            add_batch_size: ADD_BATCH_SIZE,
            album_page_size: ALBUM_PAGE_SIZE,
            playlist_page_size: PLAYLIST_PAGE_SIZE,
            max_artist_pages: None,
        }
    }
}

impl SyncConfig {
    /// Get default configuration file paths in order of preference
    #[must_use]
    pub fn get_default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("playlist-sync.toml"),
            PathBuf::from("config/playlist-sync.toml"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("playlist-sync").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".playlist-sync.toml"));
        }

        paths
    }

    /// Load configuration from defaults, the first config file found and the
    /// environment, in increasing priority. CLI flags are applied by the caller.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_file::<&str>(None)
    }

    /// Load configuration with a specific config file
    pub fn load_with_file<P: AsRef<Path>>(config_file: Option<P>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        builder = builder.add_source(Config::try_from(&Self::default())?);

        if let Some(file_path) = config_file {
            // An explicit file must exist.
            builder = builder.add_source(File::from(file_path.as_ref()).required(true));
        } else if let Some(config_path) = Self::get_default_config_paths()
            .into_iter()
            .find(|path| path.exists())
        {
            log::debug!("Loading configuration from {}", config_path.display());
            builder = builder.add_source(File::from(config_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("PLAYLIST_SYNC")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("sync.artists")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Check that every value a run needs is present.
    pub fn validate(&self) -> Result<(), SyncError> {
        let required = [
            ("spotify.client_id", &self.spotify.client_id),
            ("spotify.client_secret", &self.spotify.client_secret),
            ("napster.api_key", &self.napster.api_key),
            ("napster.secret_key", &self.napster.secret_key),
            ("napster.username", &self.napster.username),
            ("napster.password", &self.napster.password),
            ("sync.playlist_name", &self.sync.playlist_name),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(SyncError::InvalidConfig(format!(
                "missing required values: {}",
                missing.join(", ")
            )));
        }

        if self.sync.artists.iter().all(|a| a.trim().is_empty()) {
            return Err(SyncError::EmptyAllowList);
        }

        if self.sync.add_batch_size == 0
            || self.sync.favorites_page_size == 0
            || self.sync.album_page_size == 0
            || self.sync.playlist_page_size == 0
        {
            return Err(SyncError::InvalidConfig(
                "page and batch sizes must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// The market filter, if one is set.
    pub fn market(&self) -> Option<&str> {
        self.spotify
            .market
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    pub fn to_sync_options(&self) -> SyncOptions {
        SyncOptions {
            playlist_name: self.sync.playlist_name.clone(),
            allow_list: self.sync.artists.clone(),
            dry_run: self.sync.dry_run,
            add_batch_size: self.sync.add_batch_size,
            import: ImportOptions {
                market: self.market().map(str::to_string),
                favorites_page_size: self.sync.favorites_page_size,
                playlist_page_size: self.sync.playlist_page_size,
                resolver: ResolverOptions {
                    album_page_size: self.sync.album_page_size,
                    max_artist_pages: self.sync.max_artist_pages,
                },
            },
        }
    }
}

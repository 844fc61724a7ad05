/// Failures raised by a catalog client (either side of the sync).
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Still rate limited by {endpoint} after {attempts} attempts")]
    RateLimited { endpoint: String, attempts: u32 },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Failures of the interactive authorization handshake or a credential login.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization was denied: {0}")]
    Denied(String),

    #[error("Authorization response carried no code")]
    MissingCode,

    #[error("Authorization response state did not match the request")]
    StateMismatch,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Invalid redirect URL: {0}")]
    InvalidRedirect(String),

    #[error("Could not bind callback server on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Authorization callback server failed: {0}")]
    Server(std::io::Error),

    #[error("Authorization handoff closed before a token arrived")]
    ChannelClosed,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Every way a sync run can fail.
///
/// The three not-found kinds are expected during resolution and are turned into
/// diagnostics by the importer; everything else aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Artist not found: [{artist}]")]
    ArtistNotFound { artist: String },

    #[error("Album not found: [{artist}] [{album}]")]
    AlbumNotFound { artist: String, album: String },

    #[error("Track not found: [{album}] [{track}]")]
    TrackNotFound { album: String, track: String },

    #[error("Playlist not found: [{name}]")]
    PlaylistNotFound { name: String },

    #[error("At least one artist must be given to import")]
    EmptyAllowList,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl SyncError {
    /// Whether the importer may record this error and move on to the next album.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::ArtistNotFound { .. }
                | SyncError::AlbumNotFound { .. }
                | SyncError::TrackNotFound { .. }
        )
    }
}

//! The narrow interfaces the sync core needs from each music service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CatalogError;

pub mod memory;

pub use memory::{MemoryDestination, MemorySource};

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

catalog_id!(
    /// Destination catalog artist identifier.
    ArtistId
);
catalog_id!(
    /// Destination catalog album identifier.
    AlbumId
);
catalog_id!(
    /// Destination catalog track identifier.
    TrackId
);
catalog_id!(PlaylistId);
catalog_id!(UserId);

/// A favorite as listed by the source catalog, before its details are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRef {
    pub id: String,
}

/// Source catalog track metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTrack {
    pub id: String,
    pub artist_name: String,
    pub album_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
}

/// One page of an artist search. `next` is an opaque cursor owned by the
/// catalog implementation; `None` means there are no further pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistPage {
    pub query: String,
    pub artists: Vec<Artist>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlbumType {
    Album,
    Single,
    Compilation,
    AppearsOn,
    #[serde(other)]
    Other,
}

impl AlbumType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumType::Album => "album",
            AlbumType::Single => "single",
            AlbumType::Compilation => "compilation",
            AlbumType::AppearsOn => "appears_on",
            AlbumType::Other => "other",
        }
    }
}

impl fmt::Display for AlbumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub name: String,
    pub album_type: AlbumType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumTrack {
    pub id: TrackId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
}

/// A playlist item. Local files carry no catalog identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub track_id: Option<TrackId>,
}

/// Offset/limit paging with the optional filters some listings accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u32,
    pub limit: u32,
    /// Two-letter market code; restricts listings to one region's releases.
    pub market: Option<String>,
    pub album_type: Option<AlbumType>,
}

impl PageRequest {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self {
            offset,
            limit,
            market: None,
            album_type: None,
        }
    }

    pub fn with_market(mut self, market: Option<&str>) -> Self {
        self.market = market
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_album_type(mut self, album_type: AlbumType) -> Self {
        self.album_type = Some(album_type);
        self
    }

    /// The request for the page after one that returned `received` items.
    pub fn advance(&mut self, received: usize) {
        self.offset += received as u32;
    }
}

/// The catalog favorites are read from. Authentication happens when the
/// concrete client is built.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// One page of the user's favorite tracks; an empty page ends the listing.
    async fn list_favorites(&self, offset: u32, limit: u32)
        -> Result<Vec<FavoriteRef>, CatalogError>;

    /// Bulk metadata lookup for favorites.
    async fn track_details(&self, ids: &[String]) -> Result<Vec<SourceTrack>, CatalogError>;
}

/// The catalog holding the playlist being filled.
///
/// Every read is safe to repeat, so clients may retry them freely.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DestinationCatalog: Send + Sync {
    async fn search_artists(&self, query: &str) -> Result<ArtistPage, CatalogError>;

    /// The page after `page`, or `None` when the search is exhausted.
    async fn next_artist_page(&self, page: &ArtistPage)
        -> Result<Option<ArtistPage>, CatalogError>;

    async fn list_artist_albums(
        &self,
        artist_id: &ArtistId,
        request: &PageRequest,
    ) -> Result<Vec<Album>, CatalogError>;

    /// The complete tracklist of an album.
    async fn get_album_tracks(&self, album_id: &AlbumId) -> Result<Vec<AlbumTrack>, CatalogError>;

    async fn get_playlists_for_user(&self, user_id: &UserId)
        -> Result<Vec<Playlist>, CatalogError>;

    async fn get_playlist_tracks(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
        request: &PageRequest,
    ) -> Result<Vec<PlaylistEntry>, CatalogError>;

    async fn current_user_id(&self) -> Result<UserId, CatalogError>;

    /// Identifiers travel in a size-limited request, so callers send bounded batches.
    async fn add_tracks_to_playlist(
        &self,
        user_id: &UserId,
        playlist_id: &PlaylistId,
        track_ids: &[TrackId],
    ) -> Result<(), CatalogError>;
}

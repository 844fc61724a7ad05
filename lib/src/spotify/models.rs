//! Spotify Web API response shapes, limited to the fields the sync reads.

use serde::Deserialize;

use crate::catalog::{
    Album, AlbumId, AlbumTrack, AlbumType, Artist, ArtistId, Playlist, PlaylistEntry, PlaylistId,
    TrackId,
};

/// Spotify's standard paging envelope. `next` is an absolute URL.
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistSearchResponse {
    pub artists: Paging<SimpleArtist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimpleArtist {
    pub id: String,
    pub name: String,
}

impl From<SimpleArtist> for Artist {
    fn from(artist: SimpleArtist) -> Self {
        Artist {
            id: ArtistId(artist.id),
            name: artist.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimpleAlbum {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "album_type_lenient")]
    pub album_type: AlbumType,
}

impl From<SimpleAlbum> for Album {
    fn from(album: SimpleAlbum) -> Self {
        Album {
            id: AlbumId(album.id),
            name: album.name,
            album_type: album.album_type,
        }
    }
}

/// Older responses use upper-case album types.
fn album_type_lenient<'de, D>(deserializer: D) -> Result<AlbumType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(match raw.to_lowercase().as_str() {
        "album" => AlbumType::Album,
        "single" => AlbumType::Single,
        "compilation" => AlbumType::Compilation,
        "appears_on" => AlbumType::AppearsOn,
        _ => AlbumType::Other,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimpleTrack {
    pub id: String,
    pub name: String,
}

impl From<SimpleTrack> for AlbumTrack {
    fn from(track: SimpleTrack) -> Self {
        AlbumTrack {
            id: TrackId(track.id),
            name: track.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimplePlaylist {
    pub id: String,
    pub name: String,
}

impl From<SimplePlaylist> for Playlist {
    fn from(playlist: SimplePlaylist) -> Self {
        Playlist {
            id: PlaylistId(playlist.id),
            name: playlist.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrackItem {
    /// Null for tracks removed from the catalog.
    #[serde(default)]
    pub track: Option<PlaylistTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrack {
    /// Null for local files.
    #[serde(default)]
    pub id: Option<String>,
}

impl From<PlaylistTrackItem> for PlaylistEntry {
    fn from(item: PlaylistTrackItem) -> Self {
        PlaylistEntry {
            track_id: item.track.and_then(|track| track.id).map(TrackId),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrivateUser {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
}

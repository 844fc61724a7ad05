use std::collections::HashMap;
use std::fmt;

use crate::catalog::{AlbumId, ArtistId, TrackId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AlbumKey {
    artist_id: ArtistId,
    album_name: String,
}

/// Memoized destination lookups for one sync run.
///
/// Entries are only written after a confirmed match and are never invalidated.
/// Liberal (suffix-insensitive) album matches must not be stored here: the key
/// is the strict album name and a fuzzy hit would answer later strict lookups.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    /// Artist name -> every destination artist registered under that name
    artists: HashMap<String, Vec<ArtistId>>,
    /// (artist, strict album name) -> album
    albums: HashMap<AlbumKey, AlbumId>,
    /// Album -> normalized track name -> track
    tracks: HashMap<AlbumId, HashMap<String, TrackId>>,
    hits: CacheStats,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artists(&mut self, name: &str) -> Option<Vec<ArtistId>> {
        let found = self.artists.get(name).cloned();
        if found.is_some() {
            self.hits.artist_hits += 1;
        }
        found
    }

    pub fn cache_artists(&mut self, name: String, ids: Vec<ArtistId>) {
        self.artists.insert(name, ids);
    }

    pub fn album(&mut self, artist_id: &ArtistId, album_name: &str) -> Option<AlbumId> {
        let key = AlbumKey {
            artist_id: artist_id.clone(),
            album_name: album_name.to_string(),
        };
        let found = self.albums.get(&key).cloned();
        if found.is_some() {
            self.hits.album_hits += 1;
        }
        found
    }

    pub fn cache_album(&mut self, artist_id: ArtistId, album_name: String, album_id: AlbumId) {
        self.albums.insert(
            AlbumKey {
                artist_id,
                album_name,
            },
            album_id,
        );
    }

    /// Whether the tracklist of `album_id` is already known. Counts as a hit when it is.
    pub fn has_tracks(&mut self, album_id: &AlbumId) -> bool {
        let known = self.tracks.contains_key(album_id);
        if known {
            self.hits.tracklist_hits += 1;
        }
        known
    }

    pub fn tracks(&self, album_id: &AlbumId) -> Option<&HashMap<String, TrackId>> {
        self.tracks.get(album_id)
    }

    pub fn cache_tracks(&mut self, album_id: AlbumId, tracks: HashMap<String, TrackId>) {
        self.tracks.insert(album_id, tracks);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            artists: self.artists.len(),
            albums: self.albums.len(),
            tracklists: self.tracks.len(),
            ..self.hits.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub artists: usize,
    pub albums: usize,
    pub tracklists: usize,
    pub artist_hits: usize,
    pub album_hits: usize,
    pub tracklist_hits: usize,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Resolution cache: {} artists ({} hits), {} albums ({} hits), {} tracklists ({} hits)",
            self.artists,
            self.artist_hits,
            self.albums,
            self.album_hits,
            self.tracklists,
            self.tracklist_hits
        )
    }
}

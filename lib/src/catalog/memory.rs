use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{
    Album, AlbumId, AlbumTrack, AlbumType, Artist, ArtistId, ArtistPage, DestinationCatalog,
    FavoriteRef, PageRequest, Playlist, PlaylistEntry, PlaylistId, SourceCatalog, SourceTrack,
    TrackId, UserId,
};
use crate::error::CatalogError;

/// Number of calls made against an in-memory catalog, per operation.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub search_artists: AtomicUsize,
    pub next_artist_page: AtomicUsize,
    pub list_artist_albums: AtomicUsize,
    pub get_album_tracks: AtomicUsize,
    pub get_playlists_for_user: AtomicUsize,
    pub get_playlist_tracks: AtomicUsize,
    pub current_user_id: AtomicUsize,
    pub add_tracks_to_playlist: AtomicUsize,
    pub list_favorites: AtomicUsize,
    pub track_details: AtomicUsize,
}

impl CallCounts {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct StoredAlbum {
    album: Album,
    /// Empty means available everywhere.
    markets: Vec<String>,
}

/// In-memory destination catalog - useful for testing and dry experiments.
///
/// Artist search is a case-insensitive substring match, paged by
/// `artist_page_size`. Added tracks are appended to the stored playlist and
/// every add batch is recorded.
#[derive(Debug)]
pub struct MemoryDestination {
    user_id: UserId,
    artists: Vec<Artist>,
    artist_page_size: usize,
    albums: HashMap<ArtistId, Vec<StoredAlbum>>,
    album_tracks: HashMap<AlbumId, Vec<AlbumTrack>>,
    playlists: Vec<Playlist>,
    playlist_tracks: RwLock<HashMap<PlaylistId, Vec<PlaylistEntry>>>,
    added_batches: RwLock<Vec<Vec<TrackId>>>,
    pub calls: CallCounts,
}

impl Default for MemoryDestination {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self {
            user_id: UserId::new("user"),
            artists: Vec::new(),
            artist_page_size: 20,
            albums: HashMap::new(),
            album_tracks: HashMap::new(),
            playlists: Vec::new(),
            playlist_tracks: RwLock::new(HashMap::new()),
            added_batches: RwLock::new(Vec::new()),
            calls: CallCounts::default(),
        }
    }

    pub fn with_user(mut self, user_id: &str) -> Self {
        self.user_id = UserId::new(user_id);
        self
    }

    pub fn with_artist_page_size(mut self, size: usize) -> Self {
        self.artist_page_size = size.max(1);
        self
    }

    pub fn with_artist(mut self, id: &str, name: &str) -> Self {
        self.artists.push(Artist {
            id: ArtistId::new(id),
            name: name.to_string(),
        });
        self
    }

    pub fn with_album(self, artist_id: &str, id: &str, name: &str, album_type: AlbumType) -> Self {
        self.with_album_in_markets(artist_id, id, name, album_type, &[])
    }

    pub fn with_album_in_markets(
        mut self,
        artist_id: &str,
        id: &str,
        name: &str,
        album_type: AlbumType,
        markets: &[&str],
    ) -> Self {
        self.albums
            .entry(ArtistId::new(artist_id))
            .or_default()
            .push(StoredAlbum {
                album: Album {
                    id: AlbumId::new(id),
                    name: name.to_string(),
                    album_type,
                },
                markets: markets.iter().map(|m| m.to_string()).collect(),
            });
        self
    }

    pub fn with_track(mut self, album_id: &str, id: &str, name: &str) -> Self {
        self.album_tracks
            .entry(AlbumId::new(album_id))
            .or_default()
            .push(AlbumTrack {
                id: TrackId::new(id),
                name: name.to_string(),
            });
        self
    }

    pub fn with_playlist(mut self, id: &str, name: &str, track_ids: &[&str]) -> Self {
        self.playlists.push(Playlist {
            id: PlaylistId::new(id),
            name: name.to_string(),
        });
        let entries = track_ids
            .iter()
            .map(|track_id| PlaylistEntry {
                track_id: Some(TrackId::new(*track_id)),
            })
            .collect();
        self.playlist_tracks
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .insert(PlaylistId::new(id), entries);
        self
    }

    /// Every batch passed to `add_tracks_to_playlist`, in call order.
    pub fn added_batches(&self) -> Vec<Vec<TrackId>> {
        self.added_batches
            .read()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }

    /// Current contents of a playlist.
    pub fn playlist_contents(&self, playlist_id: &str) -> Vec<TrackId> {
        self.playlist_tracks
            .read()
            .ok()
            .and_then(|playlists| playlists.get(&PlaylistId::new(playlist_id)).cloned())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| entry.track_id)
            .collect()
    }

    fn artist_page(&self, query: &str, offset: usize) -> ArtistPage {
        let needle = query.to_lowercase();
        let matching: Vec<&Artist> = self
            .artists
            .iter()
            .filter(|artist| artist.name.to_lowercase().contains(&needle))
            .collect();

        let artists = matching
            .iter()
            .skip(offset)
            .take(self.artist_page_size)
            .map(|artist| (*artist).clone())
            .collect();

        let next_offset = offset + self.artist_page_size;
        ArtistPage {
            query: query.to_string(),
            artists,
            next: (next_offset < matching.len()).then(|| next_offset.to_string()),
        }
    }
}

#[async_trait]
impl DestinationCatalog for MemoryDestination {
    async fn search_artists(&self, query: &str) -> Result<ArtistPage, CatalogError> {
        CallCounts::bump(&self.calls.search_artists);
        Ok(self.artist_page(query, 0))
    }

    async fn next_artist_page(
        &self,
        page: &ArtistPage,
    ) -> Result<Option<ArtistPage>, CatalogError> {
        CallCounts::bump(&self.calls.next_artist_page);
        let Some(cursor) = &page.next else {
            return Ok(None);
        };
        let offset = cursor
            .parse::<usize>()
            .map_err(|e| CatalogError::Decode(format!("bad page cursor '{cursor}': {e}")))?;
        Ok(Some(self.artist_page(&page.query, offset)))
    }

    async fn list_artist_albums(
        &self,
        artist_id: &ArtistId,
        request: &PageRequest,
    ) -> Result<Vec<Album>, CatalogError> {
        CallCounts::bump(&self.calls.list_artist_albums);
        let albums = self
            .albums
            .get(artist_id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(albums
            .iter()
            .filter(|stored| {
                request
                    .album_type
                    .map_or(true, |wanted| stored.album.album_type == wanted)
            })
            .filter(|stored| match &request.market {
                Some(market) => {
                    stored.markets.is_empty() || stored.markets.iter().any(|m| m == market)
                }
                None => true,
            })
            .skip(request.offset as usize)
            .take(request.limit as usize)
            .map(|stored| stored.album.clone())
            .collect())
    }

    async fn get_album_tracks(&self, album_id: &AlbumId) -> Result<Vec<AlbumTrack>, CatalogError> {
        CallCounts::bump(&self.calls.get_album_tracks);
        Ok(self.album_tracks.get(album_id).cloned().unwrap_or_default())
    }

    async fn get_playlists_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<Playlist>, CatalogError> {
        CallCounts::bump(&self.calls.get_playlists_for_user);
        Ok(self.playlists.clone())
    }

    async fn get_playlist_tracks(
        &self,
        _user_id: &UserId,
        playlist_id: &PlaylistId,
        request: &PageRequest,
    ) -> Result<Vec<PlaylistEntry>, CatalogError> {
        CallCounts::bump(&self.calls.get_playlist_tracks);
        let playlists = self
            .playlist_tracks
            .read()
            .map_err(|e| CatalogError::Decode(format!("playlist store poisoned: {e}")))?;

        Ok(playlists
            .get(playlist_id)
            .map(|entries| {
                entries
                    .iter()
                    .skip(request.offset as usize)
                    .take(request.limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn current_user_id(&self) -> Result<UserId, CatalogError> {
        CallCounts::bump(&self.calls.current_user_id);
        Ok(self.user_id.clone())
    }

    async fn add_tracks_to_playlist(
        &self,
        _user_id: &UserId,
        playlist_id: &PlaylistId,
        track_ids: &[TrackId],
    ) -> Result<(), CatalogError> {
        CallCounts::bump(&self.calls.add_tracks_to_playlist);
        let mut playlists = self
            .playlist_tracks
            .write()
            .map_err(|e| CatalogError::Decode(format!("playlist store poisoned: {e}")))?;
        playlists
            .entry(playlist_id.clone())
            .or_default()
            .extend(track_ids.iter().map(|id| PlaylistEntry {
                track_id: Some(id.clone()),
            }));

        self.added_batches
            .write()
            .map_err(|e| CatalogError::Decode(format!("batch log poisoned: {e}")))?
            .push(track_ids.to_vec());
        Ok(())
    }
}

/// In-memory source catalog holding a fixed list of favorites.
#[derive(Debug, Default)]
pub struct MemorySource {
    favorites: Vec<SourceTrack>,
    pub calls: CallCounts,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_favorite(mut self, artist: &str, album: &str, track: &str) -> Self {
        let id = format!("Tra.{}", self.favorites.len() + 1);
        self.favorites.push(SourceTrack {
            id,
            artist_name: artist.to_string(),
            album_name: album.to_string(),
            name: track.to_string(),
        });
        self
    }
}

#[async_trait]
impl SourceCatalog for MemorySource {
    async fn list_favorites(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<FavoriteRef>, CatalogError> {
        CallCounts::bump(&self.calls.list_favorites);
        Ok(self
            .favorites
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|track| FavoriteRef {
                id: track.id.clone(),
            })
            .collect())
    }

    async fn track_details(&self, ids: &[String]) -> Result<Vec<SourceTrack>, CatalogError> {
        CallCounts::bump(&self.calls.track_details);
        Ok(ids
            .iter()
            .filter_map(|id| self.favorites.iter().find(|track| &track.id == id))
            .cloned()
            .collect())
    }
}

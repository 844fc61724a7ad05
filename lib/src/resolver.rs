use std::collections::HashMap;

use crate::cache::ResolutionCache;
use crate::catalog::{AlbumId, AlbumType, ArtistId, DestinationCatalog, PageRequest, TrackId};
use crate::error::SyncError;
use crate::normalize::{match_key, titles_equal};

/// Default page size for artist album listings.
pub const ALBUM_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    pub album_page_size: u32,
    /// Stop an artist search after this many pages. `None` pages until the
    /// catalog runs out.
    pub max_artist_pages: Option<usize>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            album_page_size: ALBUM_PAGE_SIZE,
            max_artist_pages: None,
        }
    }
}

/// A requested track name that was found on the destination album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub id: TrackId,
    /// The requested name, trimmed and lower-cased.
    pub name: String,
}

/// Result of looking up a set of names within one destination album.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackResolution {
    /// Found tracks, in request order.
    pub found: Vec<ResolvedTrack>,
    /// Requested names the album does not contain, trimmed and lower-cased.
    pub missing: Vec<String>,
}

impl TrackResolution {
    pub fn track_ids(&self) -> Vec<TrackId> {
        self.found.iter().map(|track| track.id.clone()).collect()
    }
}

enum AlbumSearch {
    Resolved(TrackResolution),
    /// An album matched but none of the requested tracks are on it.
    AlbumOnly,
    NoAlbum,
}

/// Finds destination identifiers for source (artist, album, track) names.
///
/// Lookups are memoized in the borrowed [`ResolutionCache`], so one cache
/// should be shared by every resolver in a run and dropped with it.
pub struct DestinationResolver<'a, D: DestinationCatalog + ?Sized> {
    catalog: &'a D,
    cache: &'a mut ResolutionCache,
    options: ResolverOptions,
}

impl<'a, D: DestinationCatalog + ?Sized> DestinationResolver<'a, D> {
    pub fn new(catalog: &'a D, cache: &'a mut ResolutionCache, options: ResolverOptions) -> Self {
        Self {
            catalog,
            cache,
            options,
        }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &*self.cache
    }

    /// Every destination artist whose name equals `name`, ignoring case.
    ///
    /// Pages through the search until a page contains at least one exact match;
    /// all matches on that page are kept since catalogs sometimes register
    /// several artists under one display name.
    pub async fn resolve_artist(&mut self, name: &str) -> Result<Vec<ArtistId>, SyncError> {
        let query = name.trim().to_lowercase();

        if let Some(ids) = self.cache.artists(&query) {
            return Ok(ids);
        }

        log::debug!("Searching for artist: [{query}]");
        let mut page = self.catalog.search_artists(&query).await?;
        let mut page_number = 1;

        loop {
            log::debug!(
                "Search for artist [{query}] page ({page_number}): {} candidates",
                page.artists.len()
            );

            let matches: Vec<ArtistId> = page
                .artists
                .iter()
                .enumerate()
                .filter(|(_, artist)| artist.name.trim().to_lowercase() == query)
                .map(|(i, artist)| {
                    log::debug!("Found ID for artist [{query}]: ({i}) [{}]", artist.id);
                    artist.id.clone()
                })
                .collect();

            if !matches.is_empty() {
                self.cache.cache_artists(query, matches.clone());
                return Ok(matches);
            }

            if self
                .options
                .max_artist_pages
                .is_some_and(|max| page_number >= max)
            {
                log::debug!("Giving up on artist [{query}] after ({page_number}) pages.");
                break;
            }

            match self.catalog.next_artist_page(&page).await? {
                Some(next) => {
                    page = next;
                    page_number += 1;
                }
                None => break,
            }
        }

        Err(SyncError::ArtistNotFound {
            artist: name.to_string(),
        })
    }

    /// The first album of type "album" under `artist_id` whose name matches.
    ///
    /// `market` restricts the listing to one region, which hides most duplicate
    /// regional releases. With `liberal` set, trailing qualifiers such as
    /// "(Remastered)" are ignored; those matches are never cached.
    pub async fn resolve_album(
        &mut self,
        artist_id: &ArtistId,
        album_name: &str,
        market: Option<&str>,
        liberal: bool,
    ) -> Result<AlbumId, SyncError> {
        let album_name = album_name.trim().to_lowercase();

        if !liberal {
            if let Some(id) = self.cache.album(artist_id, &album_name) {
                return Ok(id);
            }
        }

        log::debug!("Searching for album [{album_name}] under artist with ID [{artist_id}].");

        let mut request = PageRequest::new(0, self.options.album_page_size)
            .with_market(market)
            .with_album_type(AlbumType::Album);
        let mut available = Vec::new();

        loop {
            let albums = self
                .catalog
                .list_artist_albums(artist_id, &request)
                .await?;
            if albums.is_empty() {
                break;
            }

            for album in &albums {
                available.push(format!("{} ({})", album.name, album.album_type));

                if album.album_type != AlbumType::Album {
                    continue;
                }

                if titles_equal(&album.name, &album_name, liberal) {
                    log::debug!(
                        "Found ID for album under artist-ID [{artist_id}]: [{album_name}] found as [{}]",
                        album.name
                    );
                    if !liberal {
                        self.cache
                            .cache_album(artist_id.clone(), album_name, album.id.clone());
                    }
                    return Ok(album.id.clone());
                }
            }

            request.advance(albums.len());
        }

        log::debug!(
            "Album [{album_name}] under artist-ID [{artist_id}] not found (LIBERAL=[{liberal}])."
        );
        if liberal {
            for (i, candidate) in available.iter().enumerate() {
                log::debug!("Available album under artist-ID [{artist_id}]: ({i}) [{candidate}]");
            }
        }

        Err(SyncError::AlbumNotFound {
            artist: artist_id.to_string(),
            album: album_name,
        })
    }

    /// Look up track names within an album. Names the album lacks are reported
    /// in `missing`; that is not an error.
    pub async fn resolve_tracks(
        &mut self,
        album_id: &AlbumId,
        track_names: &[String],
    ) -> Result<TrackResolution, SyncError> {
        if !self.cache.has_tracks(album_id) {
            let tracks = self.catalog.get_album_tracks(album_id).await?;

            let mut by_name = HashMap::new();
            for track in tracks {
                by_name.entry(match_key(&track.name)).or_insert(track.id);
            }
            self.cache.cache_tracks(album_id.clone(), by_name);
        }

        let available = self.cache.tracks(album_id);
        let mut resolution = TrackResolution::default();

        for name in track_names {
            let key = match_key(name);
            let name = name.trim().to_lowercase();
            match available.and_then(|tracks| tracks.get(&key)) {
                Some(id) => {
                    log::debug!("Found: [{album_id}] [{name}] => [{id}]");
                    resolution.found.push(ResolvedTrack {
                        id: id.clone(),
                        name,
                    });
                }
                None => {
                    log::debug!("Track [{name}] under album-ID [{album_id}] not found.");
                    resolution.missing.push(name);
                }
            }
        }

        if !resolution.missing.is_empty() {
            if let Some(tracks) = available {
                log::debug!(
                    "({}) tracks are available in album-ID [{album_id}].",
                    tracks.len()
                );
                let mut names: Vec<&String> = tracks.keys().collect();
                names.sort();
                for (i, name) in names.into_iter().enumerate() {
                    log::debug!("Available track under album-ID [{album_id}]: ({i}) [{name}]");
                }
            }
        }

        Ok(resolution)
    }

    /// Resolve several tracks of one source album.
    ///
    /// Every candidate artist is tried with a strict album match first, then
    /// every candidate again with a liberal match. The first combination that
    /// yields at least one track wins; matches from other candidates are not
    /// merged in.
    pub async fn resolve_album_tracks(
        &mut self,
        artist_name: &str,
        album_name: &str,
        track_names: &[String],
        market: Option<&str>,
    ) -> Result<TrackResolution, SyncError> {
        match self
            .search_album_tracks(artist_name, album_name, track_names, market)
            .await?
        {
            AlbumSearch::Resolved(resolution) => Ok(resolution),
            AlbumSearch::AlbumOnly | AlbumSearch::NoAlbum => Err(SyncError::AlbumNotFound {
                artist: artist_name.to_string(),
                album: album_name.to_string(),
            }),
        }
    }

    /// Resolve a single track.
    pub async fn resolve_track(
        &mut self,
        artist_name: &str,
        album_name: &str,
        track_name: &str,
        market: Option<&str>,
    ) -> Result<TrackId, SyncError> {
        let names = [track_name.to_string()];
        let search = self
            .search_album_tracks(artist_name, album_name, &names, market)
            .await?;

        match search {
            AlbumSearch::Resolved(resolution) => resolution
                .found
                .into_iter()
                .next()
                .map(|track| track.id)
                .ok_or_else(|| SyncError::TrackNotFound {
                    album: album_name.to_string(),
                    track: track_name.to_string(),
                }),
            AlbumSearch::AlbumOnly => Err(SyncError::TrackNotFound {
                album: album_name.to_string(),
                track: track_name.to_string(),
            }),
            AlbumSearch::NoAlbum => Err(SyncError::AlbumNotFound {
                artist: artist_name.to_string(),
                album: album_name.to_string(),
            }),
        }
    }

    async fn search_album_tracks(
        &mut self,
        artist_name: &str,
        album_name: &str,
        track_names: &[String],
        market: Option<&str>,
    ) -> Result<AlbumSearch, SyncError> {
        let candidates = self.resolve_artist(artist_name).await?;
        let mut album_matched = false;

        for liberal in [false, true] {
            for artist_id in &candidates {
                let album_id = match self
                    .resolve_album(artist_id, album_name, market, liberal)
                    .await
                {
                    Ok(id) => id,
                    Err(SyncError::AlbumNotFound { .. }) => continue,
                    Err(e) => return Err(e),
                };
                album_matched = true;

                let resolution = self.resolve_tracks(&album_id, track_names).await?;
                if resolution.found.is_empty() {
                    log::debug!(
                        "Album [{album_id}] matched [{album_name}] but holds none of the requested tracks."
                    );
                    continue;
                }

                return Ok(AlbumSearch::Resolved(resolution));
            }
        }

        Ok(if album_matched {
            AlbumSearch::AlbumOnly
        } else {
            AlbumSearch::NoAlbum
        })
    }
}

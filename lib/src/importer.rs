use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::cache::{CacheStats, ResolutionCache};
use crate::catalog::{
    DestinationCatalog, PlaylistId, SourceCatalog, SourceTrack, TrackId, UserId,
};
use crate::error::SyncError;
use crate::playlist::{build_index, PlaylistLocator, PLAYLIST_PAGE_SIZE};
use crate::resolver::{DestinationResolver, ResolverOptions};
use crate::track::{AlbumGroupKey, NormalizedTrack};

/// Default number of favorites requested per page.
pub const FAVORITES_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Restrict destination album listings to one market.
    pub market: Option<String>,
    pub favorites_page_size: u32,
    pub playlist_page_size: u32,
    pub resolver: ResolverOptions,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            market: None,
            favorites_page_size: FAVORITES_PAGE_SIZE,
            playlist_page_size: PLAYLIST_PAGE_SIZE,
            resolver: ResolverOptions::default(),
        }
    }
}

/// A destination track queued for addition, with the source names it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackToAdd {
    pub id: TrackId,
    pub track: NormalizedTrack,
}

/// Something a source favorite referred to that the destination lacks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MissingEntry {
    Artist {
        artist: String,
    },
    Album {
        artist: String,
        album: String,
    },
    Track {
        artist: String,
        album: String,
        track: String,
    },
}

impl fmt::Display for MissingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingEntry::Artist { artist } => write!(f, "artist not found: [{artist}]"),
            MissingEntry::Album { artist, album } => {
                write!(f, "album not found: [{artist}] [{album}]")
            }
            MissingEntry::Track {
                artist,
                album,
                track,
            } => write!(f, "track not found: [{artist}] [{album}] [{track}]"),
        }
    }
}

/// Everything a run skipped or could not find, each cause recorded once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    ignored_artists: BTreeSet<String>,
    missing: Vec<MissingEntry>,
    seen: HashSet<MissingEntry>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_artist(&mut self, artist: &str) {
        self.ignored_artists.insert(artist.to_string());
    }

    /// Record a missing entry. Returns `false` when the same entry was already recorded.
    pub fn record_missing(&mut self, entry: MissingEntry) -> bool {
        if !self.seen.insert(entry.clone()) {
            return false;
        }
        log::warn!("{entry}");
        self.missing.push(entry);
        true
    }

    /// Artists dropped by the allow-list, sorted.
    pub fn ignored_artists(&self) -> impl Iterator<Item = &str> {
        self.ignored_artists.iter().map(String::as_str)
    }

    /// Missing entries in the order they were discovered.
    pub fn missing(&self) -> &[MissingEntry] {
        &self.missing
    }
}

/// Result of the import phase of a run.
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Tracks to add, in discovery order.
    pub tracks: Vec<TrackToAdd>,
    /// (artist, album) groups dropped because their artist is not allow-listed.
    pub skipped: usize,
    /// Resolved tracks that the playlist already holds.
    pub already_present: usize,
    pub diagnostics: Diagnostics,
    pub user_id: UserId,
    pub playlist_id: PlaylistId,
    pub cache: CacheStats,
}

impl ImportReport {
    pub fn added(&self) -> usize {
        self.tracks.len()
    }

    pub fn missing(&self) -> usize {
        self.diagnostics.missing().len()
    }

    pub fn track_ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|track| track.id.clone()).collect()
    }

    pub fn log_summary(&self) {
        for artist in self.diagnostics.ignored_artists() {
            log::warn!("IGNORING ARTIST: [{artist}]");
        }

        for (i, entry) in self.diagnostics.missing().iter().enumerate() {
            log::warn!("NOT FOUND: ({i}) {entry}");
        }

        log::info!("{}", self.cache);
        log::info!(
            "Import: ({}) to add, ({}) already in playlist, ({}) albums skipped, ({}) not found.",
            self.added(),
            self.already_present,
            self.skipped,
            self.missing()
        );
    }
}

/// Source track titles sharing one (artist, album) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumGroup {
    pub key: AlbumGroupKey,
    pub track_names: Vec<String>,
}

/// Group tracks by (artist, album), keeping the order in which groups and
/// titles were first seen.
pub fn group_by_album<'a, I>(tracks: I) -> Vec<AlbumGroup>
where
    I: IntoIterator<Item = &'a SourceTrack>,
{
    let mut groups: Vec<AlbumGroup> = Vec::new();
    let mut positions: HashMap<AlbumGroupKey, usize> = HashMap::new();

    for track in tracks {
        let normalized = NormalizedTrack::from(track);
        let key = normalized.group_key();

        let position = *positions.entry(key.clone()).or_insert_with(|| {
            groups.push(AlbumGroup {
                key,
                track_names: Vec::new(),
            });
            groups.len() - 1
        });

        groups[position].track_names.push(normalized.track_name);
    }

    groups
}

/// Pulls favorites from the source catalog and resolves them against the
/// destination playlist.
pub struct Importer<'a, S: SourceCatalog + ?Sized, D: DestinationCatalog + ?Sized> {
    source: &'a S,
    destination: &'a D,
    options: ImportOptions,
}

impl<'a, S, D> Importer<'a, S, D>
where
    S: SourceCatalog + ?Sized,
    D: DestinationCatalog + ?Sized,
{
    pub fn new(source: &'a S, destination: &'a D, options: ImportOptions) -> Self {
        Self {
            source,
            destination,
            options,
        }
    }

    /// Every source favorite, fetched page by page until an empty page.
    pub async fn fetch_favorites(&self) -> Result<Vec<SourceTrack>, SyncError> {
        if self.options.favorites_page_size == 0 {
            return Err(SyncError::InvalidConfig(
                "favorites page size must be positive".to_string(),
            ));
        }

        let mut tracks = Vec::new();
        let mut offset = 0u32;

        loop {
            let refs = self
                .source
                .list_favorites(offset, self.options.favorites_page_size)
                .await?;
            if refs.is_empty() {
                break;
            }
            offset += refs.len() as u32;

            let ids: Vec<String> = refs.into_iter().map(|r| r.id).collect();
            let details = self.source.track_details(&ids).await?;
            log::info!(
                "Fetched ({}) favorites ({} so far).",
                details.len(),
                tracks.len() + details.len()
            );
            tracks.extend(details);
        }

        Ok(tracks)
    }

    /// Resolve the allow-listed favorites that `playlist_name` does not yet hold.
    pub async fn import(
        &self,
        playlist_name: &str,
        allow_list: &[String],
    ) -> Result<ImportReport, SyncError> {
        let allowed: HashSet<String> = allow_list
            .iter()
            .map(|artist| artist.trim().to_lowercase())
            .filter(|artist| !artist.is_empty())
            .collect();
        if allowed.is_empty() {
            return Err(SyncError::EmptyAllowList);
        }

        let market = self.options.market.as_deref();

        let mut locator = PlaylistLocator::new();
        let user_id = locator.current_user_id(self.destination).await?;
        let playlist_id = locator
            .playlist_id(self.destination, &user_id, playlist_name)
            .await?;
        let existing = build_index(
            self.destination,
            &user_id,
            &playlist_id,
            market,
            self.options.playlist_page_size,
        )
        .await?;

        let favorites = self.fetch_favorites().await?;
        let groups = group_by_album(&favorites);
        log::info!(
            "({}) favorites grouped into ({}) albums.",
            favorites.len(),
            groups.len()
        );

        let mut cache = ResolutionCache::new();
        let mut resolver =
            DestinationResolver::new(self.destination, &mut cache, self.options.resolver.clone());

        let mut diagnostics = Diagnostics::new();
        let mut failed_artists: HashSet<String> = HashSet::new();
        let mut queued: HashSet<TrackId> = HashSet::new();
        let mut tracks = Vec::new();
        let mut skipped = 0;
        let mut already_present = 0;

        for group in groups {
            let AlbumGroup { key, track_names } = group;

            if !allowed.contains(&key.artist_name) {
                log::debug!("Artist [{}] is not in the allow-list.", key.artist_name);
                diagnostics.ignore_artist(&key.artist_name);
                skipped += 1;
                continue;
            }

            // Group keys are unique, so only artists can repeat across groups.
            if failed_artists.contains(&key.artist_name) {
                log::debug!("Skipping {key}: artist already known to be missing.");
                continue;
            }

            let resolution = match resolver
                .resolve_album_tracks(&key.artist_name, &key.album_name, &track_names, market)
                .await
            {
                Ok(resolution) => resolution,
                Err(SyncError::ArtistNotFound { .. }) => {
                    diagnostics.record_missing(MissingEntry::Artist {
                        artist: key.artist_name.clone(),
                    });
                    failed_artists.insert(key.artist_name);
                    continue;
                }
                Err(SyncError::AlbumNotFound { .. }) => {
                    diagnostics.record_missing(MissingEntry::Album {
                        artist: key.artist_name.clone(),
                        album: key.album_name.clone(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            for name in &resolution.missing {
                diagnostics.record_missing(MissingEntry::Track {
                    artist: key.artist_name.clone(),
                    album: key.album_name.clone(),
                    track: name.clone(),
                });
            }

            for found in resolution.found {
                if existing.contains(&found.id) {
                    log::debug!("Already in playlist: {key} [{}]", found.name);
                    already_present += 1;
                    continue;
                }

                if !queued.insert(found.id.clone()) {
                    continue;
                }

                let track = NormalizedTrack::new(
                    [&key.artist_name],
                    &key.album_name,
                    &found.name,
                );
                log::info!("Will add: {track} => [{}]", found.id);
                tracks.push(TrackToAdd {
                    id: found.id,
                    track,
                });
            }
        }

        let cache_stats = resolver.cache().stats();

        Ok(ImportReport {
            tracks,
            skipped,
            already_present,
            diagnostics,
            user_id,
            playlist_id,
            cache: cache_stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_track(id: &str, artist: &str, album: &str, name: &str) -> SourceTrack {
        SourceTrack {
            id: id.to_string(),
            artist_name: artist.to_string(),
            album_name: album.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let tracks = vec![
            source_track("1", "Queen", "Jazz", "Mustapha"),
            source_track("2", "Yes", "Fragile", "Roundabout"),
            source_track("3", "queen", "JAZZ", "Bicycle Race"),
        ];

        let groups = group_by_album(&tracks);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, AlbumGroupKey::new("queen", "jazz"));
        assert_eq!(groups[0].track_names, vec!["mustapha", "bicycle race"]);
        assert_eq!(groups[1].key, AlbumGroupKey::new("yes", "fragile"));
    }

    #[test]
    fn missing_entries_are_recorded_once() {
        let mut diagnostics = Diagnostics::new();
        let entry = MissingEntry::Artist {
            artist: "x".to_string(),
        };

        assert!(diagnostics.record_missing(entry.clone()));
        assert!(!diagnostics.record_missing(entry));
        assert_eq!(diagnostics.missing().len(), 1);
    }

    #[test]
    fn ignored_artists_are_sorted() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.ignore_artist("zz top");
        diagnostics.ignore_artist("abba");
        diagnostics.ignore_artist("zz top");

        assert_eq!(
            diagnostics.ignored_artists().collect::<Vec<_>>(),
            vec!["abba", "zz top"]
        );
    }

    #[test]
    fn missing_entries_display_their_cause() {
        let album = MissingEntry::Album {
            artist: "x".to_string(),
            album: "y".to_string(),
        };
        let track = MissingEntry::Track {
            artist: "x".to_string(),
            album: "y".to_string(),
            track: "z".to_string(),
        };
        assert_eq!(album.to_string(), "album not found: [x] [y]");
        assert_eq!(track.to_string(), "track not found: [x] [y] [z]");
    }
}

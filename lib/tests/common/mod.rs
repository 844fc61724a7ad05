/// Common test fixtures
use playlist_sync::catalog::{AlbumType, MemoryDestination, MemorySource};
use playlist_sync::importer::ImportOptions;
use playlist_sync::sync::SyncOptions;

pub const PLAYLIST: &str = "Napster Favorites";

pub fn artists(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// A destination holding artist X with album Y (tracks Z and Z2), and an empty
/// target playlist.
#[allow(dead_code)]
pub fn xyz_destination() -> MemoryDestination {
    MemoryDestination::new()
        .with_artist("ar-x", "X")
        .with_album("ar-x", "al-y", "Y", AlbumType::Album)
        .with_track("al-y", "tr-z", "Z")
        .with_track("al-y", "tr-z2", "Z2")
        .with_playlist("pl-1", PLAYLIST, &[])
}

#[allow(dead_code)]
pub fn single_favorite(artist: &str, album: &str, track: &str) -> MemorySource {
    MemorySource::new().with_favorite(artist, album, track)
}

#[allow(dead_code)]
pub fn sync_options(allow_list: &[&str]) -> SyncOptions {
    SyncOptions::new(PLAYLIST, artists(allow_list))
}

#[allow(dead_code)]
pub fn import_options() -> ImportOptions {
    ImportOptions::default()
}

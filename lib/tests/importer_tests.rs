mod common;

use common::*;
use playlist_sync::catalog::memory::CallCounts;
use playlist_sync::catalog::{AlbumType, MemoryDestination, MemorySource, TrackId};
use playlist_sync::importer::{Importer, MissingEntry};
use playlist_sync::SyncError;

#[test_log::test(tokio::test)]
async fn allow_listed_favorite_is_queued() {
    let source = single_favorite("X", "Y", "Z");
    let destination = xyz_destination();

    let report = Importer::new(&source, &destination, import_options())
        .import(PLAYLIST, &artists(&["x"]))
        .await
        .unwrap();

    assert_eq!(report.track_ids(), vec![TrackId::new("tr-z")]);
    assert_eq!(report.added(), 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.missing(), 0);
    assert_eq!(report.tracks[0].track.track_name, "z");
    assert_eq!(report.tracks[0].track.album_name, "y");
}

#[test_log::test(tokio::test)]
async fn queued_tracks_keep_the_source_title() {
    let source = single_favorite("X", "Y", "Don't Stop, Me!");
    let destination = MemoryDestination::new()
        .with_artist("ar-x", "X")
        .with_album("ar-x", "al-y", "Y", AlbumType::Album)
        .with_track("al-y", "tr-1", "Don't Stop Me")
        .with_playlist("pl-1", PLAYLIST, &[]);

    let report = Importer::new(&source, &destination, import_options())
        .import(PLAYLIST, &artists(&["x"]))
        .await
        .unwrap();

    assert_eq!(report.track_ids(), vec![TrackId::new("tr-1")]);
    assert_eq!(report.tracks[0].track.track_name, "don't stop, me!");
}

#[test_log::test(tokio::test)]
async fn artists_outside_the_allow_list_are_skipped() {
    let source = single_favorite("W", "Y", "Z");
    let destination = xyz_destination();

    let report = Importer::new(&source, &destination, import_options())
        .import(PLAYLIST, &artists(&["x"]))
        .await
        .unwrap();

    assert!(report.tracks.is_empty());
    assert_eq!(report.skipped, 1);
    assert_eq!(
        report.diagnostics.ignored_artists().collect::<Vec<_>>(),
        vec!["w"]
    );
    assert_eq!(CallCounts::get(&destination.calls.search_artists), 0);
}

#[test_log::test(tokio::test)]
async fn skipped_counts_albums_not_tracks() {
    let source = MemorySource::new()
        .with_favorite("W", "Y", "One")
        .with_favorite("W", "Y", "Two")
        .with_favorite("W", "Other", "Three")
        .with_favorite("X", "Y", "Z");
    let destination = xyz_destination();

    let report = Importer::new(&source, &destination, import_options())
        .import(PLAYLIST, &artists(&["x"]))
        .await
        .unwrap();

    assert_eq!(report.track_ids(), vec![TrackId::new("tr-z")]);
    assert_eq!(report.skipped, 2);
}

#[test_log::test(tokio::test)]
async fn missing_album_does_not_hide_other_albums_of_the_artist() {
    let source = MemorySource::new()
        .with_favorite("X", "Unreleased", "Q")
        .with_favorite("X", "Y", "Z");
    let destination = xyz_destination();

    let report = Importer::new(&source, &destination, import_options())
        .import(PLAYLIST, &artists(&["x"]))
        .await
        .unwrap();

    assert_eq!(report.track_ids(), vec![TrackId::new("tr-z")]);
    assert_eq!(report.missing(), 1);
}

#[test_log::test(tokio::test)]
async fn missing_artist_is_reported_once() {
    let source = MemorySource::new()
        .with_favorite("X", "Y", "Z")
        .with_favorite("X", "Y", "Z2")
        .with_favorite("X", "Other Album", "Q");
    let destination = MemoryDestination::new().with_playlist("pl-1", PLAYLIST, &[]);

    let report = Importer::new(&source, &destination, import_options())
        .import(PLAYLIST, &artists(&["x"]))
        .await
        .unwrap();

    assert!(report.tracks.is_empty());
    assert_eq!(
        report.diagnostics.missing(),
        &[MissingEntry::Artist {
            artist: "x".to_string()
        }]
    );
    // The second album is short-circuited without another search.
    assert_eq!(CallCounts::get(&destination.calls.search_artists), 1);
}

#[test_log::test(tokio::test)]
async fn tracks_already_in_the_playlist_are_excluded() {
    let source = single_favorite("X", "Y", "Z");
    let destination = MemoryDestination::new()
        .with_artist("ar-x", "X")
        .with_album("ar-x", "al-y", "Y", AlbumType::Album)
        .with_track("al-y", "tr-z", "Z")
        .with_playlist("pl-1", PLAYLIST, &["tr-z"]);

    let report = Importer::new(&source, &destination, import_options())
        .import(PLAYLIST, &artists(&["x"]))
        .await
        .unwrap();

    assert_eq!(report.added(), 0);
    assert_eq!(report.already_present, 1);
}

#[test_log::test(tokio::test)]
async fn empty_allow_list_fails_before_any_request() {
    let source = single_favorite("X", "Y", "Z");
    let destination = xyz_destination();

    let err = Importer::new(&source, &destination, import_options())
        .import(PLAYLIST, &artists(&["  "]))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::EmptyAllowList));
    assert_eq!(CallCounts::get(&destination.calls.current_user_id), 0);
    assert_eq!(CallCounts::get(&source.calls.list_favorites), 0);
}

#[test_log::test(tokio::test)]
async fn unknown_playlist_aborts_the_import() {
    let source = single_favorite("X", "Y", "Z");
    let destination = xyz_destination();

    let err = Importer::new(&source, &destination, import_options())
        .import("Some Other Playlist", &artists(&["x"]))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::PlaylistNotFound { .. }));
    assert_eq!(CallCounts::get(&source.calls.list_favorites), 0);
}

#[test_log::test(tokio::test)]
async fn albums_are_grouped_across_favorite_pages() {
    let source = MemorySource::new()
        .with_favorite("X", "Y", "Z")
        .with_favorite("Other", "Album", "Song")
        .with_favorite("X", "Y", "Z2");
    let destination = xyz_destination();

    let mut options = import_options();
    options.favorites_page_size = 1;

    let report = Importer::new(&source, &destination, options)
        .import(PLAYLIST, &artists(&["x"]))
        .await
        .unwrap();

    assert_eq!(
        report.track_ids(),
        vec![TrackId::new("tr-z"), TrackId::new("tr-z2")]
    );
    assert_eq!(report.skipped, 1);
    // One fetch per favorite plus the terminating empty page.
    assert_eq!(CallCounts::get(&source.calls.list_favorites), 4);
    // Both tracks were resolved from a single album lookup.
    assert_eq!(CallCounts::get(&destination.calls.get_album_tracks), 1);
    assert_eq!(CallCounts::get(&destination.calls.list_artist_albums), 1);
}

#[test_log::test(tokio::test)]
async fn missing_tracks_are_reported_per_title() {
    let source = MemorySource::new()
        .with_favorite("X", "Y", "Z")
        .with_favorite("X", "Y", "Lost Song");
    let destination = xyz_destination();

    let report = Importer::new(&source, &destination, import_options())
        .import(PLAYLIST, &artists(&["X"]))
        .await
        .unwrap();

    assert_eq!(report.track_ids(), vec![TrackId::new("tr-z")]);
    assert_eq!(
        report.diagnostics.missing(),
        &[MissingEntry::Track {
            artist: "x".to_string(),
            album: "y".to_string(),
            track: "lost song".to_string(),
        }]
    );
}

#[test_log::test(tokio::test)]
async fn missing_album_is_reported_with_its_artist() {
    let source = single_favorite("X", "Unreleased", "Z");
    let destination = xyz_destination();

    let report = Importer::new(&source, &destination, import_options())
        .import(PLAYLIST, &artists(&["x"]))
        .await
        .unwrap();

    assert_eq!(
        report.diagnostics.missing(),
        &[MissingEntry::Album {
            artist: "x".to_string(),
            album: "unreleased".to_string(),
        }]
    );
    assert_eq!(
        report.diagnostics.missing()[0].to_string(),
        "album not found: [x] [unreleased]"
    );
}

#[test_log::test(tokio::test)]
async fn same_destination_track_is_queued_once() {
    // Two source titles that normalize to the same destination track.
    let source = MemorySource::new()
        .with_favorite("X", "Y", "Z")
        .with_favorite("X", "Y", "Z!");
    let destination = xyz_destination();

    let report = Importer::new(&source, &destination, import_options())
        .import(PLAYLIST, &artists(&["x"]))
        .await
        .unwrap();

    assert_eq!(report.track_ids(), vec![TrackId::new("tr-z")]);
}

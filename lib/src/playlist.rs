use std::collections::HashSet;

use crate::catalog::{DestinationCatalog, PageRequest, PlaylistId, TrackId, UserId};
use crate::error::SyncError;

/// Default number of identifiers sent per add request.
pub const ADD_BATCH_SIZE: usize = 50;

/// Default page size when reading playlist contents.
pub const PLAYLIST_PAGE_SIZE: u32 = 100;

/// Collect every track identifier already present in a playlist.
///
/// Pages until the catalog returns an empty page. Any failure aborts the build;
/// a partial index must never be used. Entries with no identifier (local files)
/// are skipped.
pub async fn build_index<D: DestinationCatalog + ?Sized>(
    catalog: &D,
    user_id: &UserId,
    playlist_id: &PlaylistId,
    market: Option<&str>,
    page_size: u32,
) -> Result<HashSet<TrackId>, SyncError> {
    if page_size == 0 {
        return Err(SyncError::InvalidConfig(
            "playlist page size must be positive".to_string(),
        ));
    }

    log::info!("Reading existing tracks in playlist [{playlist_id}].");

    let mut index = HashSet::new();
    let mut request = PageRequest::new(0, page_size).with_market(market);

    loop {
        let entries = catalog
            .get_playlist_tracks(user_id, playlist_id, &request)
            .await?;
        if entries.is_empty() {
            break;
        }

        request.advance(entries.len());
        index.extend(entries.into_iter().filter_map(|entry| entry.track_id));
    }

    log::info!(
        "({}) tracks already exist in the playlist.",
        index.len()
    );

    Ok(index)
}

/// Memoized lookups of the current user and of playlists by name.
#[derive(Debug, Default)]
pub struct PlaylistLocator {
    user_id: Option<UserId>,
    playlists: Vec<(String, PlaylistId)>,
}

impl PlaylistLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current_user_id<D: DestinationCatalog + ?Sized>(
        &mut self,
        catalog: &D,
    ) -> Result<UserId, SyncError> {
        if let Some(user_id) = &self.user_id {
            return Ok(user_id.clone());
        }

        let user_id = catalog.current_user_id().await?;
        log::debug!("Current user ID: [{user_id}]");
        self.user_id = Some(user_id.clone());
        Ok(user_id)
    }

    /// The playlist owned or followed by `user_id` named `name`, compared case-insensitively.
    pub async fn playlist_id<D: DestinationCatalog + ?Sized>(
        &mut self,
        catalog: &D,
        user_id: &UserId,
        name: &str,
    ) -> Result<PlaylistId, SyncError> {
        let wanted = name.trim().to_lowercase();

        if let Some((_, id)) = self.playlists.iter().find(|(n, _)| *n == wanted) {
            return Ok(id.clone());
        }

        let playlists = catalog.get_playlists_for_user(user_id).await?;
        let found = playlists
            .into_iter()
            .find(|playlist| playlist.name.trim().to_lowercase() == wanted)
            .ok_or_else(|| SyncError::PlaylistNotFound {
                name: name.to_string(),
            })?;

        log::debug!("Playlist [{name}] has ID [{}].", found.id);
        self.playlists.push((wanted, found.id.clone()));
        Ok(found.id)
    }
}

/// Append `track_ids` to a playlist in order, at most `batch_size` per request.
///
/// Returns the number of add requests made.
pub async fn add_tracks_in_batches<D: DestinationCatalog + ?Sized>(
    catalog: &D,
    user_id: &UserId,
    playlist_id: &PlaylistId,
    track_ids: &[TrackId],
    batch_size: usize,
) -> Result<usize, SyncError> {
    if batch_size == 0 {
        return Err(SyncError::InvalidConfig(
            "add batch size must be positive".to_string(),
        ));
    }

    let mut calls = 0;
    for batch in track_ids.chunks(batch_size) {
        log::debug!("Adding batch of ({}) tracks.", batch.len());
        catalog
            .add_tracks_to_playlist(user_id, playlist_id, batch)
            .await?;
        calls += 1;
    }

    Ok(calls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryDestination, MockDestinationCatalog, Playlist};

    #[test_log::test]
    fn index_is_stable_across_builds() {
        let catalog = MemoryDestination::new().with_playlist("p1", "Mix", &["t1", "t2", "t3"]);
        let user = UserId::new("user");
        let playlist = PlaylistId::new("p1");

        let first =
            tokio_test::block_on(build_index(&catalog, &user, &playlist, None, 2)).unwrap();
        let second =
            tokio_test::block_on(build_index(&catalog, &user, &playlist, None, 2)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        // A full page, a partial page and an empty page per build.
        assert_eq!(
            crate::catalog::memory::CallCounts::get(&catalog.calls.get_playlist_tracks),
            6
        );
    }

    #[test_log::test]
    fn zero_page_size_is_rejected() {
        let catalog = MemoryDestination::new();
        let err = tokio_test::block_on(build_index(
            &catalog,
            &UserId::new("user"),
            &PlaylistId::new("p1"),
            None,
            0,
        ))
        .unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig(_)));
    }

    #[test_log::test(tokio::test)]
    async fn playlist_lookup_is_case_insensitive_and_memoized() {
        let mut catalog = MockDestinationCatalog::new();
        catalog
            .expect_get_playlists_for_user()
            .times(1)
            .returning(|_| {
                Ok(vec![
                    Playlist {
                        id: PlaylistId::new("p1"),
                        name: "Road Trip".to_string(),
                    },
                    Playlist {
                        id: PlaylistId::new("p2"),
                        name: "Napster Favorites".to_string(),
                    },
                ])
            });
        catalog
            .expect_current_user_id()
            .times(1)
            .returning(|| Ok(UserId::new("me")));

        let mut locator = PlaylistLocator::new();
        let user = locator.current_user_id(&catalog).await.unwrap();
        assert_eq!(locator.current_user_id(&catalog).await.unwrap(), user);

        let first = locator
            .playlist_id(&catalog, &user, "napster favorites")
            .await
            .unwrap();
        let second = locator
            .playlist_id(&catalog, &user, "NAPSTER FAVORITES")
            .await
            .unwrap();
        assert_eq!(first, PlaylistId::new("p2"));
        assert_eq!(first, second);
    }

    #[test_log::test(tokio::test)]
    async fn unknown_playlist_is_an_error() {
        let catalog = MemoryDestination::new().with_playlist("p1", "Mix", &[]);
        let mut locator = PlaylistLocator::new();

        let err = locator
            .playlist_id(&catalog, &UserId::new("user"), "Other")
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::PlaylistNotFound { name } if name == "Other"));
    }

    #[test_log::test(tokio::test)]
    async fn should_split_adds_into_batches() {
        let catalog = MemoryDestination::new().with_playlist("p1", "Mix", &[]);
        let ids: Vec<TrackId> = (0..7).map(|i| TrackId::new(format!("t{i}"))).collect();

        let calls = add_tracks_in_batches(
            &catalog,
            &UserId::new("user"),
            &PlaylistId::new("p1"),
            &ids,
            3,
        )
        .await
        .unwrap();

        assert_eq!(calls, 3);
        let sizes: Vec<usize> = catalog.added_batches().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(catalog.playlist_contents("p1"), ids);
    }
}

use async_trait::async_trait;
use reqwest::{header, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::models::{
    ArtistSearchResponse, ErrorResponse, Paging, PlaylistTrackItem, PrivateUser, SimpleAlbum,
    SimplePlaylist, SimpleTrack,
};
use crate::catalog::{
    Album, AlbumId, AlbumTrack, ArtistId, ArtistPage, DestinationCatalog, PageRequest, Playlist,
    PlaylistEntry, PlaylistId, TrackId, UserId,
};
use crate::config::{SpotifyConfig, DEFAULT_SPOTIFY_API_URL};
use crate::error::CatalogError;

/// Largest page the search endpoint serves.
const SEARCH_PAGE_SIZE: u32 = 50;
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Spotify Web API client bound to one user token.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    access_token: String,
    base_url: String,
    auto_retry: bool,
    max_retries: u32,
}

impl SpotifyClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token: access_token.into(),
            base_url: DEFAULT_SPOTIFY_API_URL.to_string(),
            auto_retry: true,
            max_retries: 5,
        }
    }

    pub fn from_config(config: &SpotifyConfig, access_token: impl Into<String>) -> Self {
        Self::new(access_token)
            .with_base_url(&config.api_base_url)
            .with_auto_retry(config.auto_retry, config.max_retries)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_auto_retry(mut self, enabled: bool, max_retries: u32) -> Self {
        self.auto_retry = enabled;
        self.max_retries = max_retries;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request, waiting out rate limits when auto-retry is on.
    ///
    /// `build` is called once per attempt.
    async fn send<F>(&self, endpoint: &str, build: F) -> Result<Response, CatalogError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let response = build().bearer_auth(&self.access_token).send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if !self.auto_retry || attempts > self.max_retries {
                    return Err(CatalogError::RateLimited {
                        endpoint: endpoint.to_string(),
                        attempts,
                    });
                }

                let wait = retry_after(&response);
                log::debug!("Rate limited by {endpoint}; retrying in {wait}s (attempt {attempts}).");
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let body = serde_json::from_str::<ErrorResponse>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(CatalogError::Status {
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            return Ok(response);
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let response = self
            .send(endpoint, || self.http.get(url).query(query))
            .await?;
        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Decode(format!("{endpoint}: {e}")))
    }

    /// Every item of a paged listing, following `next` links.
    async fn get_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, CatalogError> {
        let mut page: Paging<T> = self.get_json(endpoint, url, query).await?;
        let mut items = Vec::new();

        loop {
            items.append(&mut page.items);
            match page.next.take() {
                Some(next) => page = self.get_json(endpoint, &next, &[]).await?,
                None => break,
            }
        }

        Ok(items)
    }

    fn artist_page(query: &str, response: ArtistSearchResponse) -> ArtistPage {
        ArtistPage {
            query: query.to_string(),
            artists: response.artists.items.into_iter().map(Into::into).collect(),
            next: response.artists.next,
        }
    }
}

fn retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

fn page_query(request: &PageRequest) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("offset", request.offset.to_string()),
        ("limit", request.limit.to_string()),
    ];
    if let Some(market) = &request.market {
        query.push(("market", market.clone()));
    }
    query
}

/// Track URIs joined for the add endpoint's query string.
fn track_uris(track_ids: &[TrackId]) -> String {
    track_ids
        .iter()
        .map(|id| format!("spotify:track:{id}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl DestinationCatalog for SpotifyClient {
    async fn search_artists(&self, query: &str) -> Result<ArtistPage, CatalogError> {
        let response: ArtistSearchResponse = self
            .get_json(
                "search",
                &self.url("search"),
                &[
                    ("q", query.to_string()),
                    ("type", "artist".to_string()),
                    ("limit", SEARCH_PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        Ok(Self::artist_page(query, response))
    }

    async fn next_artist_page(
        &self,
        page: &ArtistPage,
    ) -> Result<Option<ArtistPage>, CatalogError> {
        let Some(next) = &page.next else {
            return Ok(None);
        };
        let response: ArtistSearchResponse = self.get_json("search", next, &[]).await?;
        Ok(Some(Self::artist_page(&page.query, response)))
    }

    async fn list_artist_albums(
        &self,
        artist_id: &ArtistId,
        request: &PageRequest,
    ) -> Result<Vec<Album>, CatalogError> {
        let mut query = page_query(request);
        if let Some(album_type) = request.album_type {
            query.push(("include_groups", album_type.to_string()));
        }

        let page: Paging<SimpleAlbum> = self
            .get_json(
                "artist albums",
                &self.url(&format!("artists/{artist_id}/albums")),
                &query,
            )
            .await?;
        Ok(page.items.into_iter().map(Into::into).collect())
    }

    async fn get_album_tracks(&self, album_id: &AlbumId) -> Result<Vec<AlbumTrack>, CatalogError> {
        let tracks: Vec<SimpleTrack> = self
            .get_all(
                "album tracks",
                &self.url(&format!("albums/{album_id}/tracks")),
                &[("limit", "50".to_string())],
            )
            .await?;
        Ok(tracks.into_iter().map(Into::into).collect())
    }

    async fn get_playlists_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Playlist>, CatalogError> {
        let playlists: Vec<SimplePlaylist> = self
            .get_all(
                "user playlists",
                &self.url(&format!("users/{user_id}/playlists")),
                &[("limit", "50".to_string())],
            )
            .await?;
        Ok(playlists.into_iter().map(Into::into).collect())
    }

    async fn get_playlist_tracks(
        &self,
        _user_id: &UserId,
        playlist_id: &PlaylistId,
        request: &PageRequest,
    ) -> Result<Vec<PlaylistEntry>, CatalogError> {
        let mut query = page_query(request);
        query.push(("fields", "items(track(id)),next".to_string()));

        let page: Paging<PlaylistTrackItem> = self
            .get_json(
                "playlist tracks",
                &self.url(&format!("playlists/{playlist_id}/tracks")),
                &query,
            )
            .await?;
        Ok(page.items.into_iter().map(Into::into).collect())
    }

    async fn current_user_id(&self) -> Result<UserId, CatalogError> {
        let user: PrivateUser = self.get_json("me", &self.url("me"), &[]).await?;
        Ok(UserId(user.id))
    }

    async fn add_tracks_to_playlist(
        &self,
        _user_id: &UserId,
        playlist_id: &PlaylistId,
        track_ids: &[TrackId],
    ) -> Result<(), CatalogError> {
        let url = self.url(&format!("playlists/{playlist_id}/tracks"));
        let uris = track_uris(track_ids);

        self.send("add tracks", || {
            self.http
                .post(&url)
                .query(&[("uris", uris.as_str())])
                .header(header::CONTENT_LENGTH, 0)
        })
        .await?;
        Ok(())
    }
}

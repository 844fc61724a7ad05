use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::models::{FavoritesResponse, TokenResponse, TracksResponse};
use crate::catalog::{FavoriteRef, SourceCatalog, SourceTrack};
use crate::config::{NapsterConfig, DEFAULT_NAPSTER_API_URL};
use crate::error::{AuthError, CatalogError};

/// Napster API client logged in as one member.
#[derive(Debug, Clone)]
pub struct NapsterClient {
    http: reqwest::Client,
    api_key: String,
    access_token: String,
    base_url: String,
}

impl NapsterClient {
    /// Log in with a password grant.
    pub async fn authenticate(
        api_key: &str,
        secret_key: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, AuthError> {
        Self::authenticate_at(DEFAULT_NAPSTER_API_URL, api_key, secret_key, username, password)
            .await
    }

    pub async fn from_config(config: &NapsterConfig) -> Result<Self, AuthError> {
        Self::authenticate_at(
            &config.api_base_url,
            &config.api_key,
            &config.secret_key,
            &config.username,
            &config.password,
        )
        .await
    }

    pub async fn authenticate_at(
        base_url: &str,
        api_key: &str,
        secret_key: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, AuthError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::new();

        log::debug!("Logging in to Napster as [{username}].");
        let response = http
            .post(format!("{base_url}/oauth/token"))
            .basic_auth(api_key, Some(secret_key))
            .form(&[
                ("username", username),
                ("password", password),
                ("grant_type", "password"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange(format!("{status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            access_token: token.access_token,
            base_url,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CatalogError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Decode(format!("{endpoint}: {e}")))
    }
}

#[async_trait]
impl SourceCatalog for NapsterClient {
    async fn list_favorites(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<FavoriteRef>, CatalogError> {
        let request = self
            .http
            .get(format!("{}/v2.2/me/favorites", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[
                ("filter", "track".to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ]);

        let response: FavoritesResponse = self.get_json("favorites", request).await?;
        Ok(response
            .favorites
            .data
            .tracks
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn track_details(&self, ids: &[String]) -> Result<Vec<SourceTrack>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .http
            .get(format!("{}/v2.2/tracks/{}", self.base_url, ids.join(",")))
            .header("apikey", &self.api_key);

        let response: TracksResponse = self.get_json("tracks", request).await?;
        Ok(response.tracks.into_iter().map(Into::into).collect())
    }
}

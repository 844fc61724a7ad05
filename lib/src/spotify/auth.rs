//! Authorization-code handshake: the operator's browser is sent to Spotify,
//! Spotify redirects it to a local callback server, and the code in that
//! redirect is exchanged for a user token.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

use crate::config::{SpotifyConfig, DEFAULT_SPOTIFY_ACCOUNTS_URL};
use crate::error::AuthError;

/// Permissions requested from the user.
pub const SCOPES: &[&str] = &[
    "user-read-private",
    "playlist-read-private",
    "playlist-modify-public",
    "playlist-modify-private",
];

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Query parameters Spotify appends to the redirect URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// The authorization code carried by a callback, if the callback is valid.
///
/// The state is checked first: nothing else in a callback that fails it can be
/// trusted.
pub fn check_callback(expected_state: &str, params: &CallbackParams) -> Result<String, AuthError> {
    if params.state.as_deref() != Some(expected_state) {
        return Err(AuthError::StateMismatch);
    }

    if let Some(error) = &params.error {
        return Err(AuthError::Denied(error.clone()));
    }

    match &params.code {
        Some(code) if !code.is_empty() => Ok(code.clone()),
        _ => Err(AuthError::MissingCode),
    }
}

/// Exchanges authorization codes for tokens.
#[derive(Debug)]
struct TokenExchange {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    accounts_base_url: String,
}

impl TokenExchange {
    async fn exchange(&self, code: &str) -> Result<SpotifyToken, AuthError> {
        let response = self
            .http
            .post(format!("{}/api/token", self.accounts_base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_url.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange(format!("{status}: {body}")));
        }

        response
            .json::<SpotifyToken>()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))
    }
}

type TokenSender = oneshot::Sender<Result<SpotifyToken, AuthError>>;

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    exchange: Arc<TokenExchange>,
    sender: Arc<Mutex<Option<TokenSender>>>,
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, &'static str) {
    let checked = check_callback(&state.expected_state, &params);
    if let Err(AuthError::StateMismatch) = checked {
        log::warn!("Ignoring authorization callback with an unexpected state.");
        return (StatusCode::BAD_REQUEST, "Unexpected authorization state.");
    }

    let Some(sender) = state.sender.lock().await.take() else {
        return (StatusCode::CONFLICT, "Authorization already handled.");
    };

    let result = match checked {
        Ok(code) => state.exchange.exchange(&code).await,
        Err(e) => Err(e),
    };

    let reply = match &result {
        Ok(_) => (
            StatusCode::OK,
            "Authorization is complete. You may close this window.",
        ),
        Err(_) => (StatusCode::BAD_REQUEST, "Authorization failed."),
    };

    if sender.send(result).is_err() {
        log::warn!("Authorization finished after the requester stopped waiting.");
    }

    reply
}

/// Runs the browser-redirect authorization flow once.
#[derive(Debug)]
pub struct SpotifyAuthorizer {
    exchange: TokenExchange,
    bind_address: String,
    state: String,
}

impl SpotifyAuthorizer {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_url: &str,
        bind_address: &str,
    ) -> Self {
        Self {
            exchange: TokenExchange {
                http: reqwest::Client::new(),
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
                redirect_url: redirect_url.to_string(),
                accounts_base_url: DEFAULT_SPOTIFY_ACCOUNTS_URL.to_string(),
            },
            bind_address: bind_address.to_string(),
            state: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn from_config(config: &SpotifyConfig) -> Self {
        Self::new(
            &config.client_id,
            &config.client_secret,
            &config.redirect_url,
            &config.bind_address,
        )
        .with_accounts_base_url(&config.accounts_base_url)
    }

    pub fn with_accounts_base_url(mut self, base_url: &str) -> Self {
        self.exchange.accounts_base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// The random value the callback must echo back.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// The URL the operator opens to grant access.
    pub fn authorize_url(&self) -> Result<String, AuthError> {
        let scopes = SCOPES.join(" ");
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.exchange.accounts_base_url),
            &[
                ("client_id", self.exchange.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.exchange.redirect_url.as_str()),
                ("scope", scopes.as_str()),
                ("state", self.state.as_str()),
            ],
        )
        .map_err(|e| AuthError::InvalidRedirect(e.to_string()))?;
        Ok(url.into())
    }

    /// Path component of the redirect URL, which the callback server routes.
    pub fn callback_path(&self) -> Result<String, AuthError> {
        let url = Url::parse(&self.exchange.redirect_url)
            .map_err(|e| AuthError::InvalidRedirect(format!("{}: {e}", self.exchange.redirect_url)))?;
        Ok(url.path().to_string())
    }

    /// Routes the redirect to a handler that delivers one token through `sender`.
    fn callback_router(self, path: &str, sender: TokenSender) -> Router {
        Router::new()
            .route(path, get(handle_callback))
            .with_state(CallbackState {
                expected_state: Arc::from(self.state.as_str()),
                exchange: Arc::new(self.exchange),
                sender: Arc::new(Mutex::new(Some(sender))),
            })
    }

    /// Open the authorization URL in a browser, wait for the redirect and
    /// return the token.
    ///
    /// The callback server stops once a callback carrying the expected state
    /// has been handled.
    pub async fn authorize(self) -> Result<SpotifyToken, AuthError> {
        let authorize_url = self.authorize_url()?;
        let path = self.callback_path()?;

        let listener = tokio::net::TcpListener::bind(&self.bind_address)
            .await
            .map_err(|source| AuthError::Bind {
                address: self.bind_address.clone(),
                source,
            })?;

        let (token_tx, token_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let bind_address = self.bind_address.clone();
        let app = self.callback_router(&path, token_tx);

        log::debug!("Authorization callback server listening on {bind_address}{path}");
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        if let Err(e) = webbrowser::open(&authorize_url) {
            log::warn!("Could not open a browser: {e}");
            log::info!("Open this URL in a browser to authorize access: {authorize_url}");
        } else {
            log::info!("Opened a browser to authorize access: {authorize_url}");
        }

        let result = token_rx.await.map_err(|_| AuthError::ChannelClosed);

        let _ = shutdown_tx.send(());
        match server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(AuthError::Server(e)),
            Err(e) => return Err(AuthError::Server(std::io::Error::other(e))),
        }

        let token = result??;
        log::info!("Authorization is complete.");
        Ok(token)
    }
}

//! Spotify as the destination catalog.

pub mod auth;
pub mod client;
pub mod models;

pub use auth::{SpotifyAuthorizer, SpotifyToken};
pub use client::SpotifyClient;

pub mod cache;
pub mod catalog;
pub mod error;
pub mod importer;
pub mod normalize;
pub mod playlist;
pub mod resolver;
pub mod sync;
pub mod track;

pub mod config;
pub mod napster;
pub mod spotify;

#[cfg(test)]
mod test_server;

pub use error::{AuthError, CatalogError, SyncError};

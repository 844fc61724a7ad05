//! Napster as the source catalog.

pub mod client;
pub mod models;

pub use client::NapsterClient;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::SourceTrack;

/// A track reduced to the lower-cased names used for matching and provenance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedTrack {
    pub artist_names: Vec<String>,
    pub album_name: String,
    pub track_name: String,
}

impl NormalizedTrack {
    pub fn new<I, S>(artist_names: I, album_name: &str, track_name: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            artist_names: artist_names
                .into_iter()
                .map(|name| name.as_ref().trim().to_lowercase())
                .collect(),
            album_name: album_name.trim().to_lowercase(),
            track_name: track_name.trim().to_lowercase(),
        }
    }

    /// The first credited artist, or an empty string for an uncredited track.
    pub fn primary_artist(&self) -> &str {
        self.artist_names.first().map(String::as_str).unwrap_or("")
    }

    /// The album this track is grouped under.
    pub fn group_key(&self) -> AlbumGroupKey {
        AlbumGroupKey::new(self.primary_artist(), &self.album_name)
    }

    /// Deterministic identity string built from the fields in declaration order.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_string())
    }
}

impl From<&SourceTrack> for NormalizedTrack {
    fn from(track: &SourceTrack) -> Self {
        Self::new([&track.artist_name], &track.album_name, &track.name)
    }
}

impl fmt::Display for NormalizedTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TRACK<[{}] [{}] [{}]>",
            self.artist_names.join(", "),
            self.album_name,
            self.track_name
        )
    }
}

/// Source tracks are batched per (artist, album) so each album is resolved once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlbumGroupKey {
    pub artist_name: String,
    pub album_name: String,
}

impl AlbumGroupKey {
    pub fn new(artist_name: &str, album_name: &str) -> Self {
        Self {
            artist_name: artist_name.trim().to_lowercase(),
            album_name: album_name.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for AlbumGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] [{}]", self.artist_name, self.album_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn should_lowercase_all_fields() {
        let track = NormalizedTrack::new(["The Beatles"], " Abbey Road ", "Come Together");
        assert_eq!(track.artist_names, vec!["the beatles"]);
        assert_eq!(track.album_name, "abbey road");
        assert_eq!(track.track_name, "come together");
        assert_eq!(track.primary_artist(), "the beatles");
    }

    #[test]
    fn fingerprint_is_stable_and_field_sensitive() {
        let a = NormalizedTrack::new(["X"], "Y", "Z");
        let b = NormalizedTrack::new(["x"], "y", "z");
        let c = NormalizedTrack::new(["x"], "y", "other");

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(
            a.fingerprint(),
            r#"{"artist_names":["x"],"album_name":"y","track_name":"z"}"#
        );
    }

    #[test]
    fn equality_covers_all_fields() {
        let mut index = HashSet::new();
        index.insert(NormalizedTrack::new(["x"], "y", "z"));

        assert!(index.contains(&NormalizedTrack::new(["X"], "Y", "Z")));
        assert!(!index.contains(&NormalizedTrack::new(["x"], "other", "z")));
    }

    #[test]
    fn should_build_group_key_from_source_track() {
        let source = SourceTrack {
            id: "Tra.1".to_string(),
            artist_name: "Queen".to_string(),
            album_name: "A Night At The Opera".to_string(),
            name: "Love Of My Life".to_string(),
        };

        let track = NormalizedTrack::from(&source);
        assert_eq!(
            track.group_key(),
            AlbumGroupKey::new("queen", "a night at the opera")
        );
        assert_eq!(track.group_key().to_string(), "[queen] [a night at the opera]");
    }
}

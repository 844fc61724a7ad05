use serde::Deserialize;

use crate::catalog::{FavoriteRef, SourceTrack};

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoritesResponse {
    pub favorites: FavoritesEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoritesEnvelope {
    pub data: FavoritesData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FavoritesData {
    #[serde(default)]
    pub tracks: Vec<FavoriteTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteTrack {
    pub id: String,
}

impl From<FavoriteTrack> for FavoriteRef {
    fn from(track: FavoriteTrack) -> Self {
        FavoriteRef { id: track.id }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TracksResponse {
    #[serde(default)]
    pub tracks: Vec<TrackDetail>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDetail {
    pub id: String,
    pub name: String,
    pub artist_name: String,
    pub album_name: String,
}

impl From<TrackDetail> for SourceTrack {
    fn from(track: TrackDetail) -> Self {
        SourceTrack {
            id: track.id,
            artist_name: track.artist_name,
            album_name: track.album_name,
            name: track.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_favorites_page() {
        let body = r#"{
            "favorites": {
                "data": {
                    "tracks": [{"id": "Tra.1", "type": "track"}, {"id": "Tra.2"}]
                }
            },
            "meta": {"totalCount": 2}
        }"#;

        let response: FavoritesResponse = serde_json::from_str(body).unwrap();
        let refs: Vec<FavoriteRef> = response
            .favorites
            .data
            .tracks
            .into_iter()
            .map(Into::into)
            .collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].id, "Tra.2");
    }

    #[test]
    fn should_parse_track_details() {
        let body = r#"{
            "tracks": [{
                "type": "track",
                "id": "Tra.5156528",
                "name": "Bohemian Rhapsody",
                "artistName": "Queen",
                "albumName": "A Night At The Opera",
                "isStreamable": true
            }]
        }"#;

        let response: TracksResponse = serde_json::from_str(body).unwrap();
        let track = SourceTrack::from(response.tracks[0].clone());
        assert_eq!(track.artist_name, "Queen");
        assert_eq!(track.album_name, "A Night At The Opera");
        assert_eq!(track.name, "Bohemian Rhapsody");
    }
}

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use serde::Deserialize;

use crate::shuffle::ShuffleError;

/// Our Song structure with the fields used by the shuffler.
///
/// Audio features are on a 0-100 scale (scaled up from the 0-1 values the
/// Web API reports), tempo is in beats per minute. A `None` feature means
/// the API had no analysis for the track.
#[derive(Debug, Clone)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist_ids: Vec<String>,
    pub artist_names: Vec<String>,
    /// Display name of the playlist this song was collected from.
    pub playlist: String,
    pub acousticness: Option<f64>,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub speechiness: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
    /// Pitch class 0-11, `None` if the analysis reported no key.
    pub key: Option<u8>,
    pub mode: Option<Mode>,
    /// Union of the genre labels of all artists on the track.
    pub genres: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Major,
    Minor,
}

const PITCH_NAMES: [&str; 12] = [
    "C", "D\u{266d}", "D", "E\u{266d}", "E", "F", "F\u{266f}", "G", "A\u{266d}", "A", "B\u{266d}",
    "B",
];

impl Song {
    /// Build a song from the raw API objects.
    ///
    /// Feature values are scaled from 0-1 to 0-100 here so the rest of the
    /// program only ever sees one scale. Genres are the union of the genre
    /// labels of the track's artists, lowercased.
    pub fn from_api(
        track: &TrackObject,
        features: Option<&AudioFeaturesObject>,
        genres_by_artist: &HashMap<String, Vec<String>>,
        playlist: &str,
    ) -> Option<Song> {
        // Local files have no track ID and no analysis; skip them
        let id = track.id.clone()?;

        let mut artist_ids = Vec::new();
        let mut artist_names = Vec::new();
        for artist in &track.artists {
            if let Some(artist_id) = &artist.id {
                if !artist_ids.contains(artist_id) {
                    artist_ids.push(artist_id.clone());
                }
            }
            artist_names.push(artist.name.clone());
        }

        let genres = artist_ids
            .iter()
            .filter_map(|artist_id| genres_by_artist.get(artist_id))
            .flatten()
            .map(|genre| genre.to_lowercase())
            .collect();

        let scale = |value: Option<f64>| value.map(|v| 100.0 * v);

        Some(Song {
            id,
            title: track.name.clone(),
            artist_ids,
            artist_names,
            playlist: playlist.to_string(),
            acousticness: scale(features.map(|f| f.acousticness)),
            danceability: scale(features.map(|f| f.danceability)),
            energy: scale(features.map(|f| f.energy)),
            instrumentalness: scale(features.map(|f| f.instrumentalness)),
            liveness: scale(features.map(|f| f.liveness)),
            speechiness: scale(features.map(|f| f.speechiness)),
            valence: scale(features.map(|f| f.valence)),
            tempo: features.map(|f| f.tempo),
            key: features
                .and_then(|f| u8::try_from(f.key).ok())
                .filter(|k| *k < 12),
            mode: features.and_then(|f| match f.mode {
                0 => Some(Mode::Minor),
                1 => Some(Mode::Major),
                _ => None,
            }),
            genres,
        })
    }

    /// All artist names joined for display.
    pub fn artist_display(&self) -> String {
        self.artist_names.join(", ")
    }

    /// Key notation for display: uppercase letter for major, lowercase for
    /// minor, `-` when the key is unknown.
    pub fn key_display(&self) -> String {
        match (self.key, self.mode) {
            (Some(key), Some(mode)) => {
                let name = PITCH_NAMES[key as usize];
                match mode {
                    Mode::Major => name.to_string(),
                    Mode::Minor => {
                        let mut chars = name.chars();
                        let letter = chars.next().unwrap_or('-').to_lowercase().to_string();
                        letter + chars.as_str()
                    }
                }
            }
            _ => "-".to_string(),
        }
    }
}

/// Which playlist to read songs from, and how many of them to take.
#[derive(Debug, Clone)]
pub struct PlaylistSpec {
    /// Owning user ID, or `"me"` for the logged-in user.
    pub user_id: String,
    pub name: String,
    pub weight: PlaylistWeight,
}

impl PlaylistSpec {
    /// Parse `USER_ID/PLAYLIST_NAME` or just `PLAYLIST_NAME` (owned by the
    /// logged-in user). The weight starts out unbounded; `assign_weights`
    /// overrides it when `-w` is given.
    pub fn parse(input: &str) -> PlaylistSpec {
        let (user_id, name) = match input.split_once('/') {
            Some((user_id, name)) => (user_id.to_string(), name.to_string()),
            None => ("me".to_string(), input.to_string()),
        };
        PlaylistSpec {
            user_id,
            name,
            weight: PlaylistWeight::Unbounded,
        }
    }

    /// `liked` or `saved` under the logged-in user means the library of
    /// saved songs rather than an actual playlist.
    pub fn is_saved_songs(&self) -> bool {
        self.user_id == "me" && matches!(self.name.as_str(), "liked" | "saved")
    }

    pub fn display(&self) -> String {
        if self.user_id == "me" {
            self.name.clone()
        } else {
            format!("{}/{}", self.user_id, self.name)
        }
    }

    /// Attach one parsed `-w` weight per spec. A mismatch between the number
    /// of playlists and the number of weights is a configuration error.
    pub fn assign_weights(
        specs: &mut [PlaylistSpec],
        weights: &[PlaylistWeight],
    ) -> Result<(), ShuffleError> {
        if weights.is_empty() {
            return Ok(());
        }
        if weights.len() != specs.len() {
            return Err(ShuffleError::Configuration(format!(
                "got {} playlist weights for {} input playlists; specify one weight per playlist",
                weights.len(),
                specs.len()
            )));
        }
        for (spec, weight) in specs.iter_mut().zip(weights) {
            spec.weight = *weight;
        }
        Ok(())
    }
}

/// Share of the output a playlist gets: a positive number for proportional
/// allocation, or `*` to always take every song.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaylistWeight {
    Unbounded,
    Weighted(f64),
}

impl FromStr for PlaylistWeight {
    type Err = ShuffleError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token == "*" {
            return Ok(PlaylistWeight::Unbounded);
        }
        match token.parse::<f64>() {
            Ok(weight) if weight.is_finite() && weight > 0.0 => {
                Ok(PlaylistWeight::Weighted(weight))
            }
            _ => Err(ShuffleError::Configuration(format!(
                "invalid playlist weight '{token}': expected a positive number or '*'"
            ))),
        }
    }
}

/// One input playlist together with the songs fetched from it.
#[derive(Debug, Clone)]
pub struct PlaylistPool {
    pub spec: PlaylistSpec,
    pub songs: Vec<Song>,
}

// --- Web API response models ---

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CurrentUser {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SavedTracksPage {
    pub items: Vec<SavedTrackItem>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SavedTrackItem {
    pub track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistsPage {
    pub items: Vec<PlaylistObject>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistObject {
    pub id: String,
    pub name: String,
    pub owner: PlaylistOwner,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistTracksPage {
    pub items: Vec<PlaylistTrackItem>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistTrackItem {
    pub track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
pub struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<AudioFeaturesObject>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesObject {
    pub id: String,
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub speechiness: f64,
    pub valence: f64,
    pub tempo: f64,
    /// Pitch class 0-11, or -1 when no key was detected.
    pub key: i32,
    /// 1 = major, 0 = minor.
    pub mode: i32,
}

#[derive(Debug, Deserialize)]
pub struct ArtistsResponse {
    pub artists: Vec<Option<ArtistObject>>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistObject {
    pub id: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedPlaylist {
    pub id: String,
    pub name: String,
}

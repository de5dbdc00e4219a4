use std::collections::BTreeSet;

use crate::models::{Mode, Song};

use super::ShuffleError;
use super::config::AudioFeature;

/// Immutable numeric projection of a song, used only by the distance
/// metric. Built once per song entering the pool and never mutated.
#[derive(Debug, Clone)]
pub struct FeatureVector {
    track_id: String,
    values: [f64; AudioFeature::ALL.len()],
    harmonic_position: Option<u8>,
    artist_ids: Vec<String>,
    genres: BTreeSet<String>,
}

impl FeatureVector {
    /// Project a song onto its feature vector.
    ///
    /// The 0-100 attributes are kept as-is (the data source already
    /// normalizes them), tempo stays in BPM, and key/mode collapse into the
    /// harmonic circle position. A missing numeric attribute has no default
    /// and is a data-quality error naming the song and the attribute; an
    /// unknown key is fine and just maxes out the key term later.
    pub fn from_song(song: &Song) -> Result<FeatureVector, ShuffleError> {
        let mut values = [0.0; AudioFeature::ALL.len()];
        for feature in AudioFeature::ALL {
            let raw = match feature {
                AudioFeature::Acousticness => song.acousticness,
                AudioFeature::Danceability => song.danceability,
                AudioFeature::Energy => song.energy,
                AudioFeature::Instrumentalness => song.instrumentalness,
                AudioFeature::Liveness => song.liveness,
                AudioFeature::Speechiness => song.speechiness,
                AudioFeature::Tempo => song.tempo,
                AudioFeature::Valence => song.valence,
            };
            values[feature.index()] = raw.ok_or_else(|| {
                ShuffleError::DataQuality(format!(
                    "track '{}' by {} ({}) has no {feature} value",
                    song.title,
                    song.artist_display(),
                    song.id
                ))
            })?;
        }

        Ok(FeatureVector {
            track_id: song.id.clone(),
            values,
            harmonic_position: harmonic_position(song.key, song.mode),
            artist_ids: song.artist_ids.clone(),
            genres: song.genres.clone(),
        })
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn value(&self, feature: AudioFeature) -> f64 {
        self.values[feature.index()]
    }

    pub fn harmonic_position(&self) -> Option<u8> {
        self.harmonic_position
    }

    pub fn genres(&self) -> &BTreeSet<String> {
        &self.genres
    }

    pub fn shares_artist(&self, other: &FeatureVector) -> bool {
        self.artist_ids
            .iter()
            .any(|artist_id| other.artist_ids.contains(artist_id))
    }
}

/// A pool member: the song itself plus its projection for the metric.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub song: Song,
    pub vector: FeatureVector,
}

/// Position of a (key, mode) pair on the 12-point harmonic circle.
///
/// Neighboring positions are a perfect fifth apart and the relative
/// major/minor pair shares a position (C major and A minor are both 0).
/// `None` if either the key or the mode is unknown.
pub fn harmonic_position(key: Option<u8>, mode: Option<Mode>) -> Option<u8> {
    let key = key?;
    match mode? {
        Mode::Major => Some((key * 7) % 12),
        Mode::Minor => Some(((key + 3) * 7) % 12),
    }
}

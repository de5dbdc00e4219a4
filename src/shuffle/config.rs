use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::ShuffleError;

/// Default seed for the quota sampler, so repeated runs pick the same songs
/// unless `--seed` is given.
pub const DEFAULT_SEED: u64 = 42;

/// The numeric audio features that enter the distance metric.
///
/// All of them are on a 0-100 scale except tempo, which stays in beats per
/// minute; its weight compensates for the differing scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFeature {
    Acousticness,
    Danceability,
    Energy,
    Instrumentalness,
    Liveness,
    Speechiness,
    Tempo,
    Valence,
}

impl AudioFeature {
    pub const ALL: [AudioFeature; 8] = [
        AudioFeature::Acousticness,
        AudioFeature::Danceability,
        AudioFeature::Energy,
        AudioFeature::Instrumentalness,
        AudioFeature::Liveness,
        AudioFeature::Speechiness,
        AudioFeature::Tempo,
        AudioFeature::Valence,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AudioFeature::Acousticness => "acousticness",
            AudioFeature::Danceability => "danceability",
            AudioFeature::Energy => "energy",
            AudioFeature::Instrumentalness => "instrumentalness",
            AudioFeature::Liveness => "liveness",
            AudioFeature::Speechiness => "speechiness",
            AudioFeature::Tempo => "tempo",
            AudioFeature::Valence => "valence",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AudioFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AudioFeature {
    type Err = ShuffleError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        AudioFeature::ALL
            .into_iter()
            .find(|feature| feature.name() == name.to_lowercase())
            .ok_or_else(|| {
                ShuffleError::Configuration(format!(
                    "unknown audio feature '{name}' (expected one of: {})",
                    AudioFeature::ALL.map(|f| f.name()).join(", ")
                ))
            })
    }
}

/// Per-feature knobs: how strongly the feature pulls similar songs together,
/// and an optional inclusive range outside of which songs are dropped.
#[derive(Debug, Clone, Copy)]
pub struct FeatureConfig {
    pub weight: f64,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

impl FeatureConfig {
    fn new(weight: f64) -> FeatureConfig {
        FeatureConfig {
            weight,
            minimum: None,
            maximum: None,
        }
    }
}

/// Configuration for the shuffling core.
#[derive(Debug, Clone)]
pub struct ShuffleConfig {
    pub(crate) features: [FeatureConfig; AudioFeature::ALL.len()],
    pub different_artist_weight: f64,
    pub genre_weight: f64,
    pub key_weight: f64,
    /// Upper bound on the candidate pool; `None` means unbounded.
    pub maximum_number_of_songs: Option<usize>,
    /// Time budget for the path solver, rounded up to whole seconds.
    pub solver_duration_seconds: f64,
    /// Seed for the quota sampler.
    pub seed: u64,
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        let mut features = [FeatureConfig::new(1.0); AudioFeature::ALL.len()];
        features[AudioFeature::Tempo.index()].weight = 2.0;
        ShuffleConfig {
            features,
            different_artist_weight: 5.0,
            genre_weight: 3.0,
            key_weight: 3.0,
            maximum_number_of_songs: None,
            solver_duration_seconds: 10.0,
            seed: DEFAULT_SEED,
        }
    }
}

impl ShuffleConfig {
    pub fn feature(&self, feature: AudioFeature) -> &FeatureConfig {
        &self.features[feature.index()]
    }

    pub fn feature_mut(&mut self, feature: AudioFeature) -> &mut FeatureConfig {
        &mut self.features[feature.index()]
    }

    /// The solver deadline: the configured duration rounded up to the next
    /// whole second.
    pub fn solver_budget(&self) -> Duration {
        Duration::from_secs(self.solver_duration_seconds.ceil() as u64)
    }

    /// Reject inconsistent options before any distance computation starts.
    /// The message names the offending key.
    pub fn validate(&self) -> Result<(), ShuffleError> {
        for feature in AudioFeature::ALL {
            let config = self.feature(feature);
            if !config.weight.is_finite() || config.weight < 0.0 {
                return Err(ShuffleError::Configuration(format!(
                    "{feature} weight must be a non-negative number, got {}",
                    config.weight
                )));
            }
            for (label, bound) in [("minimum", config.minimum), ("maximum", config.maximum)] {
                if let Some(value) = bound {
                    if !value.is_finite() {
                        return Err(ShuffleError::Configuration(format!(
                            "{feature} {label} must be a finite number, got {value}"
                        )));
                    }
                }
            }
            if let (Some(minimum), Some(maximum)) = (config.minimum, config.maximum) {
                if minimum > maximum {
                    return Err(ShuffleError::Configuration(format!(
                        "{feature} minimum {minimum} exceeds maximum {maximum}"
                    )));
                }
            }
        }
        for (key, weight) in [
            ("differentArtistWeight", self.different_artist_weight),
            ("genreWeight", self.genre_weight),
            ("keyWeight", self.key_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ShuffleError::Configuration(format!(
                    "{key} must be a non-negative number, got {weight}"
                )));
            }
        }
        if !self.solver_duration_seconds.is_finite() || self.solver_duration_seconds < 0.0 {
            return Err(ShuffleError::Configuration(format!(
                "tspSolutionDurationSeconds must be a non-negative number, got {}",
                self.solver_duration_seconds
            )));
        }
        Ok(())
    }
}

use super::config::{AudioFeature, ShuffleConfig};
use super::features::Candidate;

/// Range filtering over the normalized features.
pub struct RangeFilters;

impl RangeFilters {
    /// Check a candidate against every configured `[min, max]` bound
    /// (inclusive). Features without bounds accept everything; configured
    /// bounds compose as a conjunction.
    pub fn within_bounds(candidate: &Candidate, config: &ShuffleConfig) -> bool {
        AudioFeature::ALL.into_iter().all(|feature| {
            let bounds = config.feature(feature);
            let value = candidate.vector.value(feature);
            bounds.minimum.map_or(true, |minimum| value >= minimum)
                && bounds.maximum.map_or(true, |maximum| value <= maximum)
        })
    }

    /// Drop candidates outside any configured range. Order is preserved;
    /// the empty outcome is reported by the caller, not here.
    pub fn apply(candidates: Vec<Candidate>, config: &ShuffleConfig) -> Vec<Candidate> {
        candidates
            .into_iter()
            .filter(|candidate| Self::within_bounds(candidate, config))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::features::FeatureVector;
    use crate::shuffle::test_support::make_song;

    fn make_candidate(energy: f64, tempo: f64) -> Candidate {
        let mut song = make_song("t", "p");
        song.energy = Some(energy);
        song.tempo = Some(tempo);
        let vector = FeatureVector::from_song(&song).unwrap();
        Candidate { song, vector }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut config = ShuffleConfig::default();
        config.feature_mut(AudioFeature::Energy).minimum = Some(30.0);
        config.feature_mut(AudioFeature::Energy).maximum = Some(70.0);

        assert!(RangeFilters::within_bounds(&make_candidate(30.0, 120.0), &config));
        assert!(RangeFilters::within_bounds(&make_candidate(70.0, 120.0), &config));
        assert!(!RangeFilters::within_bounds(&make_candidate(29.9, 120.0), &config));
        assert!(!RangeFilters::within_bounds(&make_candidate(70.1, 120.0), &config));
    }

    #[test]
    fn test_filters_compose_as_conjunction() {
        let mut config = ShuffleConfig::default();
        config.feature_mut(AudioFeature::Energy).minimum = Some(50.0);
        config.feature_mut(AudioFeature::Tempo).maximum = Some(140.0);

        // Passes energy but not tempo
        assert!(!RangeFilters::within_bounds(&make_candidate(60.0, 160.0), &config));
        // Passes tempo but not energy
        assert!(!RangeFilters::within_bounds(&make_candidate(40.0, 120.0), &config));
        // Passes both
        assert!(RangeFilters::within_bounds(&make_candidate(60.0, 120.0), &config));
    }

    #[test]
    fn test_no_bounds_accept_everything() {
        let config = ShuffleConfig::default();
        let kept = RangeFilters::apply(
            vec![make_candidate(0.0, 40.0), make_candidate(100.0, 220.0)],
            &config,
        );
        assert_eq!(kept.len(), 2);
    }
}

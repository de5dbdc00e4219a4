use std::collections::BTreeSet;

use super::config::{AudioFeature, ShuffleConfig};
use super::features::FeatureVector;

/// Dissimilarity between two feature vectors: the weighted sum of absolute
/// feature differences plus the genre, key, and different-artist terms.
///
/// Each numeric term keeps the feature's native scale (0-100, or BPM for
/// tempo), so the configured weight is the only knob for relative
/// influence. Symmetric, non-negative, zero for the same track, and pure.
pub fn distance(a: &FeatureVector, b: &FeatureVector, config: &ShuffleConfig) -> f64 {
    if a.track_id() == b.track_id() {
        return 0.0;
    }

    let mut total = 0.0;
    for feature in AudioFeature::ALL {
        total += config.feature(feature).weight * (a.value(feature) - b.value(feature)).abs();
    }
    total += config.genre_weight * 100.0 * (1.0 - genre_similarity(a.genres(), b.genres()));
    total += config.key_weight * key_distance(a.harmonic_position(), b.harmonic_position());
    if !a.shares_artist(b) {
        total += config.different_artist_weight * 100.0;
    }
    total
}

/// Jaccard similarity of the genre sets. Two empty sets count as identical
/// (similarity 1); exactly one empty side shares nothing (similarity 0).
fn genre_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Steps apart on the 12-point harmonic circle, scaled to 0-100 (the far
/// side of the circle, 6 steps, maps to 100). An unknown key on either side
/// is the maximum distance.
fn key_distance(a: Option<u8>, b: Option<u8>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => {
            let step = (i32::from(a) - i32::from(b)).abs();
            let step = step.min(12 - step);
            f64::from(step) * (100.0 / 6.0)
        }
        _ => 100.0,
    }
}

/// Symmetric pairwise distance cache.
///
/// Memory is O(n²) in the pool size. For the playlist sizes this tool works
/// with (hundreds to a few thousand songs) that is cheap and saves the
/// solver from recomputing the metric millions of times; pools of tens of
/// thousands of songs would have to call `distance` on demand instead.
#[derive(Debug)]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn compute(vectors: &[FeatureVector], config: &ShuffleConfig) -> DistanceMatrix {
        let size = vectors.len();
        let mut values = vec![0.0; size * size];
        for i in 0..size {
            // The metric is symmetric, fill both halves from one computation
            for j in (i + 1)..size {
                let d = distance(&vectors[i], &vectors[j], config);
                values[i * size + j] = d;
                values[j * size + i] = d;
            }
        }
        DistanceMatrix { size, values }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.values[a * self.size + b]
    }
}

#[cfg(test)]
impl DistanceMatrix {
    /// Test helper: build a matrix from explicit rows.
    pub(crate) fn from_rows(rows: Vec<Vec<f64>>) -> DistanceMatrix {
        let size = rows.len();
        let values = rows.into_iter().flatten().collect();
        DistanceMatrix { size, values }
    }
}

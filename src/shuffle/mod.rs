pub mod config;
pub mod distance;
pub mod error;
pub mod features;
pub mod filters;
pub mod selection;
pub mod sequence;
pub mod solver;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{AudioFeature, FeatureConfig, ShuffleConfig};
pub use error::ShuffleError;
pub use sequence::{OrderedPlaylist, OrderedSong};

use log::{debug, info};

use crate::models::PlaylistPool;

use distance::DistanceMatrix;
use features::{Candidate, FeatureVector};
use filters::RangeFilters;
use selection::FilteredPool;

/// The shuffling core: turns the fetched playlists into an ordering where
/// consecutive songs are similar.
///
/// Holds no state beyond the validated configuration; it never touches the
/// network and can be run any number of times.
pub struct Shuffler {
    config: ShuffleConfig,
}

impl Shuffler {
    /// Validate the configuration up front; nothing is computed before
    /// every option has been checked.
    pub fn new(config: ShuffleConfig) -> Result<Shuffler, ShuffleError> {
        config.validate()?;
        Ok(Shuffler { config })
    }

    pub fn config(&self) -> &ShuffleConfig {
        &self.config
    }

    /// Run the full pipeline: dedup, normalize, filter, select, solve,
    /// assemble.
    pub fn shuffle(&self, playlists: Vec<PlaylistPool>) -> Result<OrderedPlaylist, ShuffleError> {
        let pools = selection::dedup_pools(playlists);

        let mut filtered_pools = Vec::with_capacity(pools.len());
        let mut fetched = 0usize;
        for pool in pools {
            let mut candidates = Vec::with_capacity(pool.songs.len());
            for song in pool.songs {
                let vector = FeatureVector::from_song(&song)?;
                candidates.push(Candidate { song, vector });
            }
            fetched += candidates.len();
            let kept = RangeFilters::apply(candidates, &self.config);
            debug!(
                "Playlist '{}': {} songs within the configured ranges",
                pool.spec.display(),
                kept.len()
            );
            filtered_pools.push(FilteredPool {
                name: pool.spec.display(),
                weight: pool.spec.weight,
                candidates: kept,
            });
        }

        if fetched == 0 {
            return Err(ShuffleError::EmptyPool(
                "the input playlists contained no usable songs".to_string(),
            ));
        }
        let within_ranges: usize = filtered_pools
            .iter()
            .map(|pool| pool.candidates.len())
            .sum();
        if within_ranges == 0 {
            return Err(ShuffleError::EmptyPool(format!(
                "all {fetched} songs fall outside the configured feature ranges"
            )));
        }

        let pool = selection::select(filtered_pools, &self.config);
        if pool.is_empty() {
            return Err(ShuffleError::EmptyPool(
                "the playlist quotas select zero songs; raise --maximum-songs or adjust the weights"
                    .to_string(),
            ));
        }
        info!("Selected {} of {} fetched songs", pool.len(), fetched);

        let vectors: Vec<FeatureVector> = pool
            .iter()
            .map(|candidate| candidate.vector.clone())
            .collect();
        let matrix = DistanceMatrix::compute(&vectors, &self.config);
        info!(
            "Solving for a smooth order over {} songs (budget {:?})...",
            pool.len(),
            self.config.solver_budget()
        );
        let path = solver::solve(&matrix, self.config.solver_budget());
        let ordered = sequence::assemble(pool, &path, &matrix);
        info!(
            "Shuffled {} songs, total path distance {:.0}",
            ordered.len(),
            ordered.total_distance
        );
        Ok(ordered)
    }
}

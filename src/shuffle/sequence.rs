use crate::models::Song;

use super::distance::DistanceMatrix;
use super::features::Candidate;

/// One entry of the final ordering: the song and how far it is from the
/// song before it (`None` for the opening song).
#[derive(Debug)]
pub struct OrderedSong {
    pub song: Song,
    pub distance_from_previous: Option<f64>,
}

/// The shuffled result handed to the display and publishing collaborators.
#[derive(Debug)]
pub struct OrderedPlaylist {
    pub songs: Vec<OrderedSong>,
    pub total_distance: f64,
}

impl OrderedPlaylist {
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Track IDs in playback order, for the publishing collaborator.
    pub fn track_ids(&self) -> Vec<String> {
        self.songs.iter().map(|entry| entry.song.id.clone()).collect()
    }
}

/// Walk the solved path and pair each song with the distance to its
/// predecessor. The deltas are read back from the metric cache, never from
/// solver internals, so display changes can't touch solver logic.
pub fn assemble(pool: Vec<Candidate>, path: &[usize], matrix: &DistanceMatrix) -> OrderedPlaylist {
    let mut slots: Vec<Option<Candidate>> = pool.into_iter().map(Some).collect();
    let mut songs = Vec::with_capacity(path.len());
    let mut total_distance = 0.0;
    let mut previous: Option<usize> = None;
    for &index in path {
        let Some(candidate) = slots.get_mut(index).and_then(Option::take) else {
            continue;
        };
        let distance_from_previous = previous.map(|previous| matrix.get(previous, index));
        if let Some(step) = distance_from_previous {
            total_distance += step;
        }
        songs.push(OrderedSong {
            song: candidate.song,
            distance_from_previous,
        });
        previous = Some(index);
    }
    OrderedPlaylist {
        songs,
        total_distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::config::ShuffleConfig;
    use crate::shuffle::distance;
    use crate::shuffle::features::FeatureVector;
    use crate::shuffle::test_support::make_song;
    use approx::assert_relative_eq;

    #[test]
    fn test_assembled_distances_match_the_metric() {
        let config = ShuffleConfig::default();
        let pool: Vec<Candidate> = [100.0, 140.0, 120.0]
            .iter()
            .enumerate()
            .map(|(index, tempo)| {
                let mut song = make_song(&format!("t{index}"), "p");
                song.tempo = Some(*tempo);
                let vector = FeatureVector::from_song(&song).unwrap();
                Candidate { song, vector }
            })
            .collect();
        let vectors: Vec<FeatureVector> =
            pool.iter().map(|candidate| candidate.vector.clone()).collect();
        let matrix = DistanceMatrix::compute(&vectors, &config);

        let ordered = assemble(pool, &[0, 2, 1], &matrix);

        assert_eq!(ordered.len(), 3);
        assert_eq!(ordered.track_ids(), vec!["t0", "t2", "t1"]);
        assert!(ordered.songs[0].distance_from_previous.is_none());
        let step_one = ordered.songs[1].distance_from_previous.unwrap();
        let step_two = ordered.songs[2].distance_from_previous.unwrap();
        assert_relative_eq!(
            step_one,
            distance::distance(&vectors[0], &vectors[2], &config)
        );
        assert_relative_eq!(
            step_two,
            distance::distance(&vectors[2], &vectors[1], &config)
        );
        assert_relative_eq!(ordered.total_distance, step_one + step_two);
    }

    #[test]
    fn test_empty_path_assembles_to_an_empty_playlist() {
        let matrix = DistanceMatrix::compute(&[], &ShuffleConfig::default());
        let ordered = assemble(Vec::new(), &[], &matrix);
        assert!(ordered.is_empty());
        assert_relative_eq!(ordered.total_distance, 0.0);
    }
}

use std::cmp::Ordering;
use std::collections::HashSet;

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;

use crate::models::{PlaylistPool, PlaylistWeight};

use super::config::ShuffleConfig;
use super::features::Candidate;

/// A playlist's post-filter candidates, ready for quota allocation.
#[derive(Debug)]
pub struct FilteredPool {
    pub name: String,
    pub weight: PlaylistWeight,
    pub candidates: Vec<Candidate>,
}

/// Remove cross-playlist duplicates, keeping the first occurrence in
/// playlist-processing order.
pub fn dedup_pools(pools: Vec<PlaylistPool>) -> Vec<PlaylistPool> {
    let mut seen = HashSet::new();
    pools
        .into_iter()
        .map(|pool| {
            let songs = pool
                .songs
                .into_iter()
                .filter(|song| seen.insert(song.id.clone()))
                .collect();
            PlaylistPool {
                spec: pool.spec,
                songs,
            }
        })
        .collect()
}

/// Pick the candidate pool under the per-playlist weights and the global
/// maximum.
///
/// Unbounded (`*`) playlists always contribute every song and are excluded
/// from the proportional math. The remaining budget is split between the
/// weighted playlists by the largest-remainder method, and each playlist's
/// share is drawn as a seeded uniform sample without replacement, so runs
/// are reproducible. Without a global maximum everything is included.
pub fn select(pools: Vec<FilteredPool>, config: &ShuffleConfig) -> Vec<Candidate> {
    let reserved: usize = pools
        .iter()
        .filter(|pool| pool.weight == PlaylistWeight::Unbounded)
        .map(|pool| pool.candidates.len())
        .sum();

    let budget = match config.maximum_number_of_songs {
        // No maximum: unbounded and weighted playlists alike are taken whole
        None => return pools.into_iter().flat_map(|pool| pool.candidates).collect(),
        Some(maximum) => maximum.saturating_sub(reserved),
    };

    let weighted: Vec<(usize, f64)> = pools
        .iter()
        .enumerate()
        .filter_map(|(position, pool)| match pool.weight {
            PlaylistWeight::Weighted(weight) => Some((position, weight)),
            PlaylistWeight::Unbounded => None,
        })
        .collect();
    let weights: Vec<f64> = weighted.iter().map(|(_, weight)| *weight).collect();
    let available: Vec<usize> = weighted
        .iter()
        .map(|(position, _)| pools[*position].candidates.len())
        .collect();
    let quotas = allocate_quotas(&weights, &available, budget);

    let mut quota_by_position = vec![None; pools.len()];
    for ((position, _), quota) in weighted.iter().zip(&quotas) {
        quota_by_position[*position] = Some(*quota);
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut selected = Vec::new();
    for (pool, quota) in pools.into_iter().zip(quota_by_position) {
        match quota {
            // Unbounded playlists are never truncated, even past the maximum
            None => {
                debug!(
                    "Playlist '{}': taking all {} songs",
                    pool.name,
                    pool.candidates.len()
                );
                selected.extend(pool.candidates);
            }
            Some(quota) => {
                debug!(
                    "Playlist '{}': quota {} of {} songs",
                    pool.name,
                    quota.min(pool.candidates.len()),
                    pool.candidates.len()
                );
                selected.extend(sample_candidates(pool.candidates, quota, &mut rng));
            }
        }
    }
    selected
}

/// Largest-remainder allocation of `budget` across weighted playlists,
/// capped at each playlist's availability.
fn allocate_quotas(weights: &[f64], available: &[usize], budget: usize) -> Vec<usize> {
    let total_weight: f64 = weights.iter().sum();
    if weights.is_empty() || total_weight <= 0.0 || budget == 0 {
        return vec![0; weights.len()];
    }

    let mut quotas = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (weight, avail) in weights.iter().zip(available) {
        let ideal = weight / total_weight * budget as f64;
        quotas.push((ideal.floor() as usize).min(*avail));
        remainders.push(ideal - ideal.floor());
    }

    // Hand out the rounding leftover one song at a time, largest fractional
    // remainder first (input order on ties), skipping exhausted playlists.
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| {
        remainders[b]
            .partial_cmp(&remainders[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    let mut leftover = budget.saturating_sub(quotas.iter().sum());
    while leftover > 0 {
        let mut handed_out = false;
        for &position in &order {
            if leftover == 0 {
                break;
            }
            if quotas[position] < available[position] {
                quotas[position] += 1;
                leftover -= 1;
                handed_out = true;
            }
        }
        if !handed_out {
            break;
        }
    }
    quotas
}

/// Uniform sample without replacement that keeps the playlist's input
/// order among the picked songs.
fn sample_candidates(
    candidates: Vec<Candidate>,
    quota: usize,
    rng: &mut StdRng,
) -> Vec<Candidate> {
    if quota >= candidates.len() {
        return candidates;
    }
    let picked: HashSet<usize> = index::sample(rng, candidates.len(), quota)
        .into_iter()
        .collect();
    candidates
        .into_iter()
        .enumerate()
        .filter(|(position, _)| picked.contains(position))
        .map(|(_, candidate)| candidate)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlaylistSpec;
    use crate::shuffle::features::FeatureVector;
    use crate::shuffle::test_support::make_song;

    fn make_pool(name: &str, weight: PlaylistWeight, count: usize) -> FilteredPool {
        let candidates = (0..count)
            .map(|index| {
                let song = make_song(&format!("{name}-{index}"), name);
                let vector = FeatureVector::from_song(&song).unwrap();
                Candidate { song, vector }
            })
            .collect();
        FilteredPool {
            name: name.to_string(),
            weight,
            candidates,
        }
    }

    fn config_with_maximum(maximum: Option<usize>) -> ShuffleConfig {
        ShuffleConfig {
            maximum_number_of_songs: maximum,
            ..ShuffleConfig::default()
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let song_a = make_song("a", "first");
        let mut song_a_again = make_song("a", "second");
        song_a_again.title = "Duplicate".to_string();
        let song_b = make_song("b", "second");

        let pools = dedup_pools(vec![
            PlaylistPool {
                spec: PlaylistSpec::parse("first"),
                songs: vec![song_a],
            },
            PlaylistPool {
                spec: PlaylistSpec::parse("second"),
                songs: vec![song_a_again, song_b],
            },
        ]);

        assert_eq!(pools[0].songs.len(), 1);
        assert_eq!(pools[1].songs.len(), 1);
        assert_eq!(pools[0].songs[0].playlist, "first");
        assert_eq!(pools[1].songs[0].id, "b");
    }

    #[test]
    fn test_equal_weights_split_the_budget() {
        let pools = vec![
            make_pool("one", PlaylistWeight::Weighted(1.0), 10),
            make_pool("two", PlaylistWeight::Weighted(1.0), 10),
        ];
        let selected = select(pools, &config_with_maximum(Some(10)));

        assert_eq!(selected.len(), 10);
        let from_one = selected
            .iter()
            .filter(|candidate| candidate.song.playlist == "one")
            .count();
        assert!((4..=6).contains(&from_one), "got {from_one} from playlist one");
    }

    #[test]
    fn test_unbounded_playlists_are_never_truncated() {
        let pools = vec![
            make_pool("all", PlaylistWeight::Unbounded, 20),
            make_pool("weighted", PlaylistWeight::Weighted(1.0), 10),
        ];
        let selected = select(pools, &config_with_maximum(Some(15)));

        // The unbounded playlist exceeds the maximum on its own, so the
        // weighted playlist contributes nothing
        assert_eq!(selected.len(), 20);
        assert!(selected.iter().all(|candidate| candidate.song.playlist == "all"));
    }

    #[test]
    fn test_no_maximum_takes_everything() {
        let pools = vec![
            make_pool("one", PlaylistWeight::Weighted(3.0), 7),
            make_pool("two", PlaylistWeight::Unbounded, 5),
        ];
        let selected = select(pools, &config_with_maximum(None));
        assert_eq!(selected.len(), 12);
    }

    #[test]
    fn test_quota_capped_at_availability() {
        // Playlist one can only supply 2 songs; its remaining share goes
        // to playlist two
        let quotas = allocate_quotas(&[1.0, 1.0], &[2, 20], 10);
        assert_eq!(quotas, vec![2, 8]);
    }

    #[test]
    fn test_largest_remainder_fills_the_budget() {
        let quotas = allocate_quotas(&[1.0, 1.0, 1.0], &[10, 10, 10], 10);
        assert_eq!(quotas.iter().sum::<usize>(), 10);
        assert!(quotas.iter().all(|quota| *quota == 3 || *quota == 4));
    }

    #[test]
    fn test_sampling_is_deterministic_for_a_seed() {
        let ids = |selected: Vec<Candidate>| {
            selected
                .into_iter()
                .map(|candidate| candidate.song.id)
                .collect::<Vec<_>>()
        };
        let config = ShuffleConfig {
            maximum_number_of_songs: Some(5),
            ..ShuffleConfig::default()
        };
        let first = ids(select(
            vec![make_pool("one", PlaylistWeight::Weighted(1.0), 30)],
            &config,
        ));
        let second = ids(select(
            vec![make_pool("one", PlaylistWeight::Weighted(1.0), 30)],
            &config,
        ));
        assert_eq!(first, second);
    }

    #[test]
    fn test_sampling_preserves_playlist_order() {
        let config = ShuffleConfig {
            maximum_number_of_songs: Some(10),
            ..ShuffleConfig::default()
        };
        let selected = select(
            vec![make_pool("one", PlaylistWeight::Weighted(1.0), 50)],
            &config,
        );
        let positions: Vec<usize> = selected
            .iter()
            .map(|candidate| {
                candidate.song.id["one-".len()..].parse::<usize>().unwrap()
            })
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }
}

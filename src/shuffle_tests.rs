// End-to-end scenarios for the shuffling core, run on hand-built pools.

use std::collections::HashSet;

use crate::models::{Mode, PlaylistPool, PlaylistSpec, PlaylistWeight, Song};
use crate::shuffle::test_support::make_song;
use crate::shuffle::{AudioFeature, ShuffleConfig, ShuffleError, Shuffler};

fn pool(name: &str, weight: PlaylistWeight, songs: Vec<Song>) -> PlaylistPool {
    let mut spec = PlaylistSpec::parse(name);
    spec.weight = weight;
    PlaylistPool { spec, songs }
}

fn songs_with_tempos(playlist: &str, tempos: &[f64]) -> Vec<Song> {
    tempos
        .iter()
        .enumerate()
        .map(|(index, tempo)| {
            let mut song = make_song(&format!("{playlist}-{index}"), playlist);
            song.tempo = Some(*tempo);
            song
        })
        .collect()
}

fn shuffled_ids(shuffler: &Shuffler, pools: Vec<PlaylistPool>) -> Vec<String> {
    shuffler
        .shuffle(pools)
        .unwrap()
        .songs
        .into_iter()
        .map(|entry| entry.song.id)
        .collect()
}

#[test]
fn test_similar_tempo_and_key_end_up_adjacent() {
    // A and B share tempo and key; C is far away on both axes, so it must
    // sit at one end of the path with A and B next to each other
    let mut a = make_song("a", "p");
    a.tempo = Some(120.0);
    a.key = Some(0); // C major
    a.mode = Some(Mode::Major);
    let mut b = make_song("b", "p");
    b.tempo = Some(121.0);
    b.key = Some(0);
    b.mode = Some(Mode::Major);
    let mut c = make_song("c", "p");
    c.tempo = Some(180.0);
    c.key = Some(6); // F♯ minor
    c.mode = Some(Mode::Minor);

    let shuffler = Shuffler::new(ShuffleConfig::default()).unwrap();
    let ids = shuffled_ids(
        &shuffler,
        vec![pool("p", PlaylistWeight::Unbounded, vec![a, b, c])],
    );

    assert_eq!(ids.len(), 3);
    let position =
        |id: &str| ids.iter().position(|candidate| candidate == id).unwrap();
    let (pos_a, pos_b, pos_c) = (position("a"), position("b"), position("c"));
    assert_eq!(
        pos_a.abs_diff(pos_b),
        1,
        "a and b should be adjacent, got {ids:?}"
    );
    assert!(
        pos_c == 0 || pos_c == 2,
        "c should be at an end, got {ids:?}"
    );
}

#[test]
fn test_output_is_a_permutation_of_the_pool() {
    let tempos: Vec<f64> = (0..9).map(|i| 90.0 + ((i * 37) % 90) as f64).collect();
    let songs = songs_with_tempos("p", &tempos);
    let expected: HashSet<String> = songs.iter().map(|song| song.id.clone()).collect();

    let shuffler = Shuffler::new(ShuffleConfig::default()).unwrap();
    let ids = shuffled_ids(&shuffler, vec![pool("p", PlaylistWeight::Unbounded, songs)]);

    assert_eq!(ids.len(), expected.len());
    assert_eq!(ids.iter().cloned().collect::<HashSet<_>>(), expected);
}

#[test]
fn test_equal_weights_split_the_maximum() {
    let config = ShuffleConfig {
        maximum_number_of_songs: Some(10),
        ..ShuffleConfig::default()
    };
    let shuffler = Shuffler::new(config).unwrap();
    let ordered = shuffler
        .shuffle(vec![
            pool(
                "one",
                PlaylistWeight::Weighted(1.0),
                songs_with_tempos("one", &[100.0; 10]),
            ),
            pool(
                "two",
                PlaylistWeight::Weighted(1.0),
                songs_with_tempos("two", &[140.0; 10]),
            ),
        ])
        .unwrap();

    assert_eq!(ordered.len(), 10);
    let from_one = ordered
        .songs
        .iter()
        .filter(|entry| entry.song.playlist == "one")
        .count();
    assert!((4..=6).contains(&from_one), "got {from_one} from playlist one");
}

#[test]
fn test_unbounded_playlist_is_never_truncated() {
    let config = ShuffleConfig {
        maximum_number_of_songs: Some(15),
        ..ShuffleConfig::default()
    };
    let shuffler = Shuffler::new(config).unwrap();
    let tempos_all: Vec<f64> = (0..20).map(|i| 80.0 + i as f64).collect();
    let tempos_weighted: Vec<f64> = (0..10).map(|i| 150.0 + i as f64).collect();
    let ordered = shuffler
        .shuffle(vec![
            pool(
                "all",
                PlaylistWeight::Unbounded,
                songs_with_tempos("all", &tempos_all),
            ),
            pool(
                "weighted",
                PlaylistWeight::Weighted(1.0),
                songs_with_tempos("weighted", &tempos_weighted),
            ),
        ])
        .unwrap();

    // The unbounded playlist alone already exceeds the maximum, so it is
    // taken whole and the weighted playlist contributes nothing
    assert_eq!(ordered.len(), 20);
    assert!(
        ordered
            .songs
            .iter()
            .all(|entry| entry.song.playlist == "all")
    );
}

#[test]
fn test_bounds_that_exclude_everything_raise_empty_pool() {
    let mut config = ShuffleConfig::default();
    config.feature_mut(AudioFeature::Energy).minimum = Some(101.0);
    let shuffler = Shuffler::new(config).unwrap();
    let error = shuffler
        .shuffle(vec![pool(
            "p",
            PlaylistWeight::Unbounded,
            songs_with_tempos("p", &[100.0, 120.0, 140.0]),
        )])
        .unwrap_err();
    assert!(matches!(error, ShuffleError::EmptyPool(_)));
}

#[test]
fn test_every_selected_song_respects_the_bounds() {
    let mut config = ShuffleConfig::default();
    config.feature_mut(AudioFeature::Energy).minimum = Some(30.0);
    config.feature_mut(AudioFeature::Energy).maximum = Some(70.0);
    let shuffler = Shuffler::new(config).unwrap();

    let songs: Vec<Song> = (0..11)
        .map(|index| {
            let mut song = make_song(&format!("e{index}"), "p");
            song.energy = Some(index as f64 * 10.0);
            song
        })
        .collect();
    let ordered = shuffler
        .shuffle(vec![pool("p", PlaylistWeight::Unbounded, songs)])
        .unwrap();

    assert_eq!(ordered.len(), 5); // energies 30, 40, 50, 60, 70
    assert!(ordered.songs.iter().all(|entry| {
        let energy = entry.song.energy.unwrap();
        (30.0..=70.0).contains(&energy)
    }));
}

#[test]
fn test_missing_feature_is_reported_not_swallowed() {
    let mut broken = make_song("broken", "p");
    broken.valence = None;
    let shuffler = Shuffler::new(ShuffleConfig::default()).unwrap();
    let error = shuffler
        .shuffle(vec![pool(
            "p",
            PlaylistWeight::Unbounded,
            vec![make_song("fine", "p"), broken],
        )])
        .unwrap_err();
    assert!(matches!(error, ShuffleError::DataQuality(_)));
    assert!(error.to_string().contains("broken"));
}

#[test]
fn test_duplicates_across_playlists_are_deduplicated() {
    let shared = make_song("shared", "one");
    let mut shared_again = make_song("shared", "two");
    shared_again.tempo = Some(97.0);

    let shuffler = Shuffler::new(ShuffleConfig::default()).unwrap();
    let ordered = shuffler
        .shuffle(vec![
            pool("one", PlaylistWeight::Unbounded, vec![shared]),
            pool(
                "two",
                PlaylistWeight::Unbounded,
                vec![shared_again, make_song("other", "two")],
            ),
        ])
        .unwrap();

    assert_eq!(ordered.len(), 2);
    let kept = ordered
        .songs
        .iter()
        .find(|entry| entry.song.id == "shared")
        .unwrap();
    // The first occurrence (from playlist "one") wins
    assert_eq!(kept.song.playlist, "one");
}

#[test]
fn test_same_seed_reproduces_the_same_order() {
    let config = ShuffleConfig {
        maximum_number_of_songs: Some(8),
        seed: 7,
        ..ShuffleConfig::default()
    };
    let tempos: Vec<f64> = (0..30).map(|i| 70.0 + ((i * 13) % 110) as f64).collect();
    let make_pools = || {
        vec![pool(
            "p",
            PlaylistWeight::Weighted(1.0),
            songs_with_tempos("p", &tempos),
        )]
    };

    let shuffler = Shuffler::new(config).unwrap();
    let first = shuffled_ids(&shuffler, make_pools());
    let second = shuffled_ids(&shuffler, make_pools());
    assert_eq!(first.len(), 8);
    assert_eq!(first, second);
}

#[test]
fn test_empty_input_raises_empty_pool() {
    let shuffler = Shuffler::new(ShuffleConfig::default()).unwrap();
    let error = shuffler
        .shuffle(vec![pool("p", PlaylistWeight::Unbounded, Vec::new())])
        .unwrap_err();
    assert!(matches!(error, ShuffleError::EmptyPool(_)));
}

use std::collections::BTreeSet;

use crate::models::{Mode, Song};

/// A song with every feature present and middle-of-the-road values, so
/// tests only tweak what they care about.
pub(crate) fn make_song(id: &str, playlist: &str) -> Song {
    Song {
        id: id.to_string(),
        title: format!("Song {id}"),
        artist_ids: vec![format!("artist-{id}")],
        artist_names: vec![format!("Artist {id}")],
        playlist: playlist.to_string(),
        acousticness: Some(50.0),
        danceability: Some(50.0),
        energy: Some(50.0),
        instrumentalness: Some(50.0),
        liveness: Some(50.0),
        speechiness: Some(50.0),
        valence: Some(50.0),
        tempo: Some(120.0),
        key: Some(0),
        mode: Some(Mode::Major),
        genres: BTreeSet::new(),
    }
}

use crate::shuffle::OrderedPlaylist;

const ARTIST_WIDTH: usize = 28;
const TITLE_WIDTH: usize = 32;

/// Render the shuffled playlist as a fixed-width table: artist, title, the
/// distance to the previous song, and the normalized feature columns.
pub fn format_table(playlist: &OrderedPlaylist) -> String {
    let mut lines = Vec::with_capacity(playlist.len() + 1);
    lines.push(format!(
        "{:<ARTIST_WIDTH$}  {:<TITLE_WIDTH$}  {:>6}  {:>3}  {:>3}  {:>3}  {:>3}  {:>4}  {:>3}  {:>3}  {:>3}  {:>3}",
        "ARTIST", "TITLE", "DST", "ACS", "DNC", "ENR", "INS", "KEY", "LVN", "SPC", "TMP", "VLN"
    ));

    for entry in &playlist.songs {
        let song = &entry.song;
        lines.push(format!(
            "{:<ARTIST_WIDTH$}  {:<TITLE_WIDTH$}  {:>6}  {:>3}  {:>3}  {:>3}  {:>3}  {:>4}  {:>3}  {:>3}  {:>3}  {:>3}",
            truncate(&song.artist_display(), ARTIST_WIDTH),
            truncate(&song.title, TITLE_WIDTH),
            cell(entry.distance_from_previous),
            cell(song.acousticness),
            cell(song.danceability),
            cell(song.energy),
            cell(song.instrumentalness),
            song.key_display(),
            cell(song.liveness),
            cell(song.speechiness),
            cell(song.tempo),
            cell(song.valence),
        ));
    }

    lines.join("\n")
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{}", value.round() as i64),
        None => "-".to_string(),
    }
}

fn truncate(text: &str, maximum: usize) -> String {
    if text.chars().count() <= maximum {
        text.to_string()
    } else {
        let kept: String = text.chars().take(maximum.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::OrderedSong;
    use crate::shuffle::test_support::make_song;

    #[test]
    fn test_first_row_has_no_distance() {
        let playlist = OrderedPlaylist {
            songs: vec![
                OrderedSong {
                    song: make_song("a", "p"),
                    distance_from_previous: None,
                },
                OrderedSong {
                    song: make_song("b", "p"),
                    distance_from_previous: Some(123.4),
                },
            ],
            total_distance: 123.4,
        };
        let table = format_table(&playlist);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("ARTIST"));
        assert!(lines[1].contains(" - "), "first song shows no distance: {}", lines[1]);
        assert!(lines[2].contains("123"));
    }

    #[test]
    fn test_long_titles_are_truncated() {
        let long = "x".repeat(100);
        assert_eq!(truncate(&long, 10).chars().count(), 10);
        assert!(truncate(&long, 10).ends_with("..."));
        assert_eq!(truncate("short", 10), "short");
    }
}

use anyhow::Result;
use clap::Parser;

mod client;
mod config;
mod display;
mod models;
mod shuffle;

#[cfg(test)]
mod shuffle_tests;

use crate::client::SpotifyClient;
use crate::config::load_credentials;
use crate::models::{PlaylistPool, PlaylistSpec, PlaylistWeight};
use crate::shuffle::{AudioFeature, ShuffleConfig, ShuffleError, Shuffler};

#[derive(Parser)]
#[command(name = "playlist-shuffler")]
#[command(about = "Shuffle Spotify playlists so that consecutive songs are similar")]
#[command(version)]
struct Args {
    /// Playlists to take songs from: 'USER_ID/NAME' for another user's
    /// playlist, 'NAME' for one of your own, or 'liked' for your saved songs
    #[arg(
        short = 'i',
        long = "input-playlists",
        num_args = 1..,
        default_values_t = [String::from("liked")]
    )]
    input_playlists: Vec<String>,

    /// One weight per input playlist: a positive number for proportional
    /// selection, or '*' to always take every song (the default)
    #[arg(
        short = 'w',
        long = "playlist-weights",
        num_args = 1..,
        value_parser = parse_playlist_weight
    )]
    playlist_weights: Vec<PlaylistWeight>,

    /// Maximum number of songs in the output; all songs if omitted
    #[arg(long = "maximum-songs")]
    maximum_songs: Option<usize>,

    /// Distance weight for one feature, e.g. 'tempo=2.5' (repeatable)
    #[arg(long = "weight", value_name = "FEATURE=VALUE", value_parser = parse_feature_value)]
    weights: Vec<(AudioFeature, f64)>,

    /// Lower bound for one feature, e.g. 'energy=40' (repeatable)
    #[arg(long = "min", value_name = "FEATURE=VALUE", value_parser = parse_feature_value)]
    minimums: Vec<(AudioFeature, f64)>,

    /// Upper bound for one feature, e.g. 'tempo=140' (repeatable)
    #[arg(long = "max", value_name = "FEATURE=VALUE", value_parser = parse_feature_value)]
    maximums: Vec<(AudioFeature, f64)>,

    /// Distance weight for songs that share no artist
    #[arg(long = "different-artist-weight")]
    different_artist_weight: Option<f64>,

    /// Distance weight for genre dissimilarity
    #[arg(long = "genre-weight")]
    genre_weight: Option<f64>,

    /// Distance weight for harmonically distant keys
    #[arg(long = "key-weight")]
    key_weight: Option<f64>,

    /// Time budget for the ordering solver in seconds (default 10,
    /// rounded up to whole seconds)
    #[arg(long = "tsp-duration")]
    tsp_duration: Option<f64>,

    /// Seed for the song sampler, for reproducible runs
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Save the shuffled songs as a playlist with this name; without it
    /// the result is only printed
    #[arg(short = 'o', long = "output-playlist")]
    output_playlist: Option<String>,

    /// Description of the output playlist; defaults to a dated note
    #[arg(long = "description")]
    description: Option<String>,

    /// Make the output playlist public instead of private
    #[arg(long = "public")]
    public: bool,

    /// Overwrite the output playlist if it already exists
    #[arg(short = 'f', long = "overwrite")]
    overwrite: bool,

    /// Only print warnings, errors, and nothing else
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Print debug log messages
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_playlist_weight(token: &str) -> Result<PlaylistWeight, String> {
    token.parse().map_err(|e: ShuffleError| e.to_string())
}

fn parse_feature_value(input: &str) -> Result<(AudioFeature, f64), String> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected FEATURE=VALUE, got '{input}'"))?;
    let feature: AudioFeature = name
        .trim()
        .parse()
        .map_err(|e: ShuffleError| e.to_string())?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid number '{value}' for {feature}"))?;
    Ok((feature, value))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.quiet, args.verbose);

    // Validate the full configuration before any network traffic
    let shuffler = Shuffler::new(build_shuffle_config(&args))?;

    let mut specs: Vec<PlaylistSpec> = args
        .input_playlists
        .iter()
        .map(|input| PlaylistSpec::parse(input))
        .collect();
    PlaylistSpec::assign_weights(&mut specs, &args.playlist_weights)?;

    let credentials = load_credentials()?;
    let client = SpotifyClient::new(credentials)?;

    let mut pools = Vec::with_capacity(specs.len());
    for spec in specs {
        let songs = client.fetch_playlist_songs(&spec)?;
        pools.push(PlaylistPool { spec, songs });
    }

    let ordered = shuffler.shuffle(pools)?;

    if !args.quiet {
        println!("{}", display::format_table(&ordered));
    }

    if let Some(name) = &args.output_playlist {
        let description = args.description.clone().unwrap_or_else(|| {
            format!(
                "Created by playlist-shuffler on {}",
                chrono::Local::now().format("%Y-%m-%d")
            )
        });
        let playlist_id = client.save_playlist(
            name,
            &description,
            args.public,
            args.overwrite,
            &ordered.track_ids(),
        )?;
        println!(
            "✓ Saved {} songs to playlist '{name}' (ID: {playlist_id})",
            ordered.len()
        );
    }

    Ok(())
}

fn init_logging(quiet: bool, verbose: u8) {
    let level = if quiet {
        log::LevelFilter::Warn
    } else if verbose == 0 {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Debug
    };
    env_logger::Builder::new().filter_level(level).init();
}

/// Resolve the shuffle configuration from defaults plus CLI overrides.
fn build_shuffle_config(args: &Args) -> ShuffleConfig {
    let mut config = ShuffleConfig::default();
    for (feature, value) in &args.weights {
        config.feature_mut(*feature).weight = *value;
    }
    for (feature, value) in &args.minimums {
        config.feature_mut(*feature).minimum = Some(*value);
    }
    for (feature, value) in &args.maximums {
        config.feature_mut(*feature).maximum = Some(*value);
    }
    if let Some(value) = args.different_artist_weight {
        config.different_artist_weight = value;
    }
    if let Some(value) = args.genre_weight {
        config.genre_weight = value;
    }
    if let Some(value) = args.key_weight {
        config.key_weight = value;
    }
    config.maximum_number_of_songs = args.maximum_songs;
    if let Some(value) = args.tsp_duration {
        config.solver_duration_seconds = value;
    }
    if let Some(value) = args.seed {
        config.seed = value;
    }
    config
}

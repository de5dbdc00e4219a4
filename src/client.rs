use std::collections::{HashMap, HashSet};

use anyhow::{Result, anyhow, bail};
use log::{debug, info, warn};
use ureq::Agent;
use urlencoding::encode;

use crate::config::Credentials;
use crate::models::{
    ArtistsResponse, AudioFeaturesObject, AudioFeaturesResponse, CreatedPlaylist, CurrentUser,
    PlaylistObject, PlaylistSpec, PlaylistTracksPage, PlaylistsPage, SavedTracksPage, Song,
    TokenResponse, TrackObject,
};

const API_BASE: &str = "https://api.spotify.com/v1";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Page size for playlist and library listings.
const PAGE_SIZE: usize = 50;
/// The audio-features endpoint accepts up to 100 track IDs per call.
const FEATURES_BATCH: usize = 100;
/// The artists endpoint accepts up to 50 artist IDs per call.
const ARTISTS_BATCH: usize = 50;
/// Playlist item writes accept up to 100 track URIs per call.
const TRACKS_BATCH: usize = 100;

/// A simple blocking Spotify Web API client.
pub struct SpotifyClient {
    agent: Agent,
    access_token: String,
}

impl SpotifyClient {
    /// Create a new client, exchanging the refresh token for an access
    /// token unless one was supplied directly.
    pub fn new(credentials: Credentials) -> Result<SpotifyClient> {
        let agent = Agent::new();
        let access_token = match &credentials.access_token {
            Some(token) => token.clone(),
            None => Self::refresh_access_token(&agent, &credentials)?,
        };
        Ok(SpotifyClient {
            agent,
            access_token,
        })
    }

    fn refresh_access_token(agent: &Agent, credentials: &Credentials) -> Result<String> {
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .ok_or_else(|| anyhow!("no access token and no refresh token configured"))?;

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", credentials.client_id.as_str()),
        ];
        if let Some(secret) = credentials.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        debug!("POST {TOKEN_URL}");
        let response = agent
            .post(TOKEN_URL)
            .send_form(&form)
            .map_err(|e| anyhow!("Token refresh failed: {e}"))?;
        let token: TokenResponse = serde_json::from_str(&response.into_string()?)
            .map_err(|e| anyhow!("Failed to parse token response: {e}"))?;
        Ok(token.access_token)
    }

    fn get_json(&self, url: &str) -> Result<String> {
        debug!("GET {url}");
        let response = self
            .agent
            .get(url)
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .call()
            .map_err(|e| anyhow!("HTTP request failed: {e}"))?;
        Ok(response.into_string()?)
    }

    fn send_json(&self, method: &str, url: &str, body: serde_json::Value) -> Result<String> {
        debug!("{method} {url}");
        let response = self
            .agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .send_json(body)
            .map_err(|e| anyhow!("HTTP request failed: {e}"))?;
        Ok(response.into_string()?)
    }

    /// ID of the logged-in user.
    pub fn current_user_id(&self) -> Result<String> {
        let user: CurrentUser = serde_json::from_str(&self.get_json(&format!("{API_BASE}/me"))?)?;
        Ok(user.id)
    }

    /// Fetch one input playlist (or the saved-songs library) as fully
    /// formed songs: track metadata plus audio features plus artist genres.
    pub fn fetch_playlist_songs(&self, spec: &PlaylistSpec) -> Result<Vec<Song>> {
        let tracks = if spec.is_saved_songs() {
            self.fetch_saved_tracks()?
        } else {
            let playlist = self.find_playlist(spec)?;
            self.fetch_playlist_tracks(&playlist.id)?
        };
        info!("Playlist '{}': {} tracks", spec.display(), tracks.len());

        let features = self.fetch_audio_features(&tracks)?;
        let genres_by_artist = self.fetch_artist_genres(&tracks)?;

        let playlist_name = spec.display();
        let songs: Vec<Song> = tracks
            .iter()
            .filter_map(|track| {
                let track_features = track
                    .id
                    .as_ref()
                    .and_then(|track_id| features.get(track_id));
                Song::from_api(track, track_features, &genres_by_artist, &playlist_name)
            })
            .collect();

        if songs.len() < tracks.len() {
            debug!(
                "Playlist '{}': skipped {} local or unresolvable tracks",
                spec.display(),
                tracks.len() - songs.len()
            );
        }
        Ok(songs)
    }

    /// The logged-in user's saved songs, page by page.
    fn fetch_saved_tracks(&self) -> Result<Vec<TrackObject>> {
        let mut tracks = Vec::new();
        let mut offset = 0;
        loop {
            let url = format!("{API_BASE}/me/tracks?limit={PAGE_SIZE}&offset={offset}");
            let page: SavedTracksPage = serde_json::from_str(&self.get_json(&url)?)?;
            let done = page.next.is_none();
            tracks.extend(page.items.into_iter().filter_map(|item| item.track));
            if done {
                return Ok(tracks);
            }
            offset += PAGE_SIZE;
        }
    }

    /// Resolve a playlist spec to an actual playlist by display name.
    fn find_playlist(&self, spec: &PlaylistSpec) -> Result<PlaylistObject> {
        let listing_url = if spec.user_id == "me" {
            format!("{API_BASE}/me/playlists")
        } else {
            format!("{API_BASE}/users/{}/playlists", encode(&spec.user_id))
        };

        let wanted = spec.name.to_lowercase();
        let mut offset = 0;
        loop {
            let url = format!("{listing_url}?limit={PAGE_SIZE}&offset={offset}");
            let page: PlaylistsPage = serde_json::from_str(&self.get_json(&url)?)?;
            let done = page.next.is_none();
            if let Some(playlist) = page
                .items
                .into_iter()
                .find(|playlist| playlist.name.to_lowercase() == wanted)
            {
                return Ok(playlist);
            }
            if done {
                bail!(
                    "playlist '{}' not found for user '{}'",
                    spec.name,
                    spec.user_id
                );
            }
            offset += PAGE_SIZE;
        }
    }

    fn fetch_playlist_tracks(&self, playlist_id: &str) -> Result<Vec<TrackObject>> {
        let mut tracks = Vec::new();
        let mut offset = 0;
        loop {
            let url = format!(
                "{API_BASE}/playlists/{}/tracks?limit={TRACKS_BATCH}&offset={offset}",
                encode(playlist_id)
            );
            let page: PlaylistTracksPage = serde_json::from_str(&self.get_json(&url)?)?;
            let done = page.next.is_none();
            tracks.extend(page.items.into_iter().filter_map(|item| item.track));
            if done {
                return Ok(tracks);
            }
            offset += TRACKS_BATCH;
        }
    }

    /// Audio features for every track, batched; tracks the API has no
    /// analysis for are simply absent from the map.
    fn fetch_audio_features(
        &self,
        tracks: &[TrackObject],
    ) -> Result<HashMap<String, AudioFeaturesObject>> {
        let track_ids: Vec<&String> = {
            let mut seen = HashSet::new();
            tracks
                .iter()
                .filter_map(|track| track.id.as_ref())
                .filter(|track_id| seen.insert(track_id.as_str()))
                .collect()
        };

        let mut features = HashMap::with_capacity(track_ids.len());
        for chunk in track_ids.chunks(FEATURES_BATCH) {
            let ids = chunk
                .iter()
                .map(|track_id| track_id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let url = format!("{API_BASE}/audio-features?ids={}", encode(&ids));
            let response: AudioFeaturesResponse = serde_json::from_str(&self.get_json(&url)?)?;
            for entry in response.audio_features.into_iter().flatten() {
                features.insert(entry.id.clone(), entry);
            }
        }

        if features.len() < track_ids.len() {
            warn!(
                "No audio analysis for {} of {} tracks",
                track_ids.len() - features.len(),
                track_ids.len()
            );
        }
        Ok(features)
    }

    /// Genre labels per artist, batched over all artists of the tracks.
    fn fetch_artist_genres(
        &self,
        tracks: &[TrackObject],
    ) -> Result<HashMap<String, Vec<String>>> {
        let artist_ids: Vec<&String> = {
            let mut seen = HashSet::new();
            tracks
                .iter()
                .flat_map(|track| &track.artists)
                .filter_map(|artist| artist.id.as_ref())
                .filter(|artist_id| seen.insert(artist_id.as_str()))
                .collect()
        };

        let mut genres = HashMap::with_capacity(artist_ids.len());
        for chunk in artist_ids.chunks(ARTISTS_BATCH) {
            let ids = chunk
                .iter()
                .map(|artist_id| artist_id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let url = format!("{API_BASE}/artists?ids={}", encode(&ids));
            let response: ArtistsResponse = serde_json::from_str(&self.get_json(&url)?)?;
            for artist in response.artists.into_iter().flatten() {
                genres.insert(artist.id, artist.genres);
            }
        }
        Ok(genres)
    }

    /// Save the ordered track IDs as a playlist under the logged-in user.
    ///
    /// Refuses to touch an existing playlist of the same name unless
    /// `overwrite` is set; overwriting replaces the playlist's items.
    pub fn save_playlist(
        &self,
        name: &str,
        description: &str,
        public: bool,
        overwrite: bool,
        track_ids: &[String],
    ) -> Result<String> {
        let user_id = self.current_user_id()?;

        let playlist_id = match self.find_own_playlist(&user_id, name)? {
            Some(existing) => {
                if !overwrite {
                    bail!(
                        "playlist '{name}' already exists; pass --overwrite to replace it"
                    );
                }
                info!("Overwriting existing playlist '{name}' ({})", existing.id);
                existing.id
            }
            None => {
                let url = format!("{API_BASE}/users/{}/playlists", encode(&user_id));
                let body = serde_json::json!({
                    "name": name,
                    "description": description,
                    "public": public,
                });
                let created: CreatedPlaylist =
                    serde_json::from_str(&self.send_json("POST", &url, body)?)?;
                info!("Created playlist '{}' ({})", created.name, created.id);
                created.id
            }
        };

        // The first batch replaces whatever the playlist held, the rest append
        let url = format!("{API_BASE}/playlists/{}/tracks", encode(&playlist_id));
        for (batch, chunk) in track_ids.chunks(TRACKS_BATCH).enumerate() {
            let uris: Vec<String> = chunk
                .iter()
                .map(|track_id| format!("spotify:track:{track_id}"))
                .collect();
            let method = if batch == 0 { "PUT" } else { "POST" };
            self.send_json(method, &url, serde_json::json!({ "uris": uris }))?;
        }

        Ok(playlist_id)
    }

    /// Look for a playlist with this display name owned by the user.
    fn find_own_playlist(&self, user_id: &str, name: &str) -> Result<Option<PlaylistObject>> {
        let wanted = name.to_lowercase();
        let mut offset = 0;
        loop {
            let url = format!("{API_BASE}/me/playlists?limit={PAGE_SIZE}&offset={offset}");
            let page: PlaylistsPage = serde_json::from_str(&self.get_json(&url)?)?;
            let done = page.next.is_none();
            if let Some(playlist) = page.items.into_iter().find(|playlist| {
                playlist.name.to_lowercase() == wanted && playlist.owner.id == user_id
            }) {
                return Ok(Some(playlist));
            }
            if done {
                return Ok(None);
            }
            offset += PAGE_SIZE;
        }
    }
}

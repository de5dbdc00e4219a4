use anyhow::{Result, bail};

/// Spotify credentials loaded from environment variables.
///
/// Either a ready access token or a refresh token (plus the app's client
/// ID) must be present; the client exchanges the refresh token itself.
#[derive(Debug)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
}

/// Load credentials from `.env` and the environment.
pub fn load_credentials() -> Result<Credentials> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    let client_id = std::env::var("SPOTIFY_CLIENT_ID").unwrap_or_default();
    let client_secret = std::env::var("SPOTIFY_CLIENT_SECRET").ok();
    let refresh_token = std::env::var("SPOTIFY_REFRESH_TOKEN").ok();
    let access_token = std::env::var("SPOTIFY_ACCESS_TOKEN").ok();

    if access_token.is_none() {
        if refresh_token.is_none() {
            bail!(
                "set SPOTIFY_ACCESS_TOKEN, or SPOTIFY_REFRESH_TOKEN plus SPOTIFY_CLIENT_ID, \
                 in the environment or a .env file"
            );
        }
        if client_id.is_empty() {
            bail!("SPOTIFY_CLIENT_ID is required to exchange SPOTIFY_REFRESH_TOKEN");
        }
    }

    Ok(Credentials {
        client_id,
        client_secret,
        refresh_token,
        access_token,
    })
}

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use dailysong_types::models::ExternalProfile;

const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const PROFILE_URL: &str = "https://api.spotify.com/v1/me";

/// Only identity is read; playback and playlist access are not requested.
const SCOPES: &str = "user-read-private user-read-email";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("request to identity provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("identity provider rejected the login: {0}")]
    Rejected(String),
}

/// The external service users log in with. It turns an authorization code
/// into a verified profile; everything past that is ours.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the user to start logging in.
    fn authorization_url(&self) -> Result<String, IdentityError>;

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, IdentityError>;
}

pub struct SpotifyIdentity {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl SpotifyIdentity {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            redirect_uri,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct SpotifyImage {
    url: String,
}

#[derive(Deserialize)]
struct SpotifyProfile {
    id: String,
    display_name: Option<String>,
    #[serde(default)]
    images: Vec<SpotifyImage>,
    country: Option<String>,
}

impl From<SpotifyProfile> for ExternalProfile {
    fn from(profile: SpotifyProfile) -> Self {
        Self {
            external_id: profile.id,
            display_name: profile.display_name,
            profile_image_url: profile.images.into_iter().next().map(|i| i.url),
            country: profile.country,
        }
    }
}

#[async_trait]
impl IdentityProvider for SpotifyIdentity {
    fn authorization_url(&self) -> Result<String, IdentityError> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", SCOPES),
                ("show_dialog", "true"),
            ],
        )
        .map_err(|e| IdentityError::Rejected(e.to_string()))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, IdentityError> {
        let token: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let profile: SpotifyProfile = self
            .client
            .get(PROFILE_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if profile.id.is_empty() {
            return Err(IdentityError::Rejected("profile has no id".into()));
        }

        debug!("Spotify login for {}", profile.id);
        Ok(profile.into())
    }
}

use super::{Catalog, CatalogError, Playlist, PlaylistPage, Track, MAX_PAGE_SIZE};
use crate::session::{Credential, UserProfile};
use futures::future::BoxFuture;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.spotify.com/v1";

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub base_url: String,
    pub playlist_limit: u32,
    pub timeout: Duration,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            playlist_limit: MAX_PAGE_SIZE,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Deserialize)]
struct PlaylistPaging {
    items: Vec<Value>,
    total: Option<u32>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    images: Option<Vec<Value>>,
}

#[derive(Deserialize)]
struct ImageObject {
    url: String,
}

#[derive(Deserialize)]
struct TrackPage {
    items: Vec<Value>,
}

#[derive(Deserialize)]
struct TrackItem {
    track: Option<TrackObject>,
}

#[derive(Deserialize)]
struct TrackObject {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    artists: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient")]
    album: Option<NamedObject>,
}

/// Artists and albums only contribute their name.
#[derive(Deserialize)]
struct NamedObject {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
}

#[derive(Deserialize)]
struct UserObject {
    display_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    images: Option<Vec<Value>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorObject,
}

#[derive(Deserialize)]
struct ErrorObject {
    message: Option<String>,
}

pub struct SpotifyClient {
    http: Client,
    base_url: Url,
    playlist_limit: u32,
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig) -> Result<Self, CatalogError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            CatalogError::Transport(format!("invalid catalog URL {}: {}", config.base_url, e))
        })?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url,
            playlist_limit: config.playlist_limit.clamp(1, MAX_PAGE_SIZE),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::Transport(format!("invalid catalog URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        token: &Credential,
        context: &str,
    ) -> Result<T, CatalogError> {
        debug!(path = url.path(), "catalog request");
        let resp = self
            .http
            .get(url)
            .bearer_auth(token.bearer())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| transport_error(context, e))?;

        let resp = check_status(resp, context).await?;
        let body = resp.text().await.map_err(|e| transport_error(context, e))?;
        serde_json::from_str(&body)
            .map_err(|e| CatalogError::Parse(format!("{}: unexpected response shape: {}", context, e)))
    }

    pub async fn playlists(&self, token: &Credential) -> Result<PlaylistPage, CatalogError> {
        let mut url = self.endpoint(&["me", "playlists"])?;
        url.query_pairs_mut()
            .append_pair("limit", &self.playlist_limit.to_string());

        let page: PlaylistPaging = self
            .get_json(url, token, "Failed to fetch playlists")
            .await?;
        Ok(normalize_playlists(page))
    }

    pub async fn tracks(
        &self,
        token: &Credential,
        playlist_id: &str,
    ) -> Result<Vec<Track>, CatalogError> {
        let url = self.endpoint(&["playlists", playlist_id, "tracks"])?;
        let page: TrackPage = self
            .get_json(url, token, "Failed to fetch playlist tracks")
            .await?;
        Ok(page.items.into_iter().map(normalize_track).collect())
    }

    pub async fn me(&self, token: &Credential) -> Result<UserProfile, CatalogError> {
        let url = self.endpoint(&["me"])?;
        let user: UserObject = self
            .get_json(url, token, "Failed to fetch user profile")
            .await?;
        Ok(UserProfile {
            display_name: user.display_name,
            avatar_url: image_urls(user.images).into_iter().next(),
        })
    }
}

impl Catalog for SpotifyClient {
    fn list_playlists<'a>(
        &'a self,
        token: &'a Credential,
    ) -> BoxFuture<'a, Result<PlaylistPage, CatalogError>> {
        Box::pin(self.playlists(token))
    }

    fn list_tracks<'a>(
        &'a self,
        token: &'a Credential,
        playlist_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Track>, CatalogError>> {
        Box::pin(self.tracks(token, playlist_id))
    }

    fn current_user<'a>(
        &'a self,
        token: &'a Credential,
    ) -> BoxFuture<'a, Result<UserProfile, CatalogError>> {
        Box::pin(self.me(token))
    }
}

fn normalize_playlists(page: PlaylistPaging) -> PlaylistPage {
    let received = page.items.len() as u32;
    let playlists: Vec<Playlist> = page.items.into_iter().filter_map(normalize_playlist).collect();
    let total = page.total.unwrap_or(received).max(received);
    let has_more = page.next.is_some() || total > received;
    if has_more {
        info!(
            loaded = playlists.len(),
            total, "library has more playlists than the first page"
        );
    }
    PlaylistPage {
        playlists,
        total,
        has_more,
    }
}

/// Entries without a usable id cannot be selected, so they are dropped.
fn normalize_playlist(raw: Value) -> Option<Playlist> {
    let item = match serde_json::from_value::<PlaylistItem>(raw) {
        Ok(item) => item,
        Err(e) => {
            warn!("unreadable playlist entry, skipping: {}", e);
            return None;
        }
    };
    let Some(id) = item.id.filter(|id| !id.trim().is_empty()) else {
        warn!("catalog returned a playlist without an id, skipping");
        return None;
    };
    Some(Playlist {
        id,
        name: item.name.unwrap_or_default(),
        images: image_urls(item.images),
    })
}

/// A null or unreadable entry becomes an empty [`Track`] so the rest of the
/// page survives. Inside an entry each field falls back on its own.
fn normalize_track(raw: Value) -> Track {
    let track = match serde_json::from_value::<TrackItem>(raw) {
        Ok(item) => item.track,
        Err(e) => {
            warn!("unreadable playlist entry: {}", e);
            None
        }
    };

    match track {
        Some(track) => Track {
            name: track.name,
            artist: track
                .artists
                .and_then(|artists| artists.into_iter().next())
                .and_then(|artist| serde_json::from_value::<NamedObject>(artist).ok())
                .and_then(|artist| artist.name),
            album: track.album.and_then(|album| album.name),
        },
        None => Track::default(),
    }
}

fn image_urls(images: Option<Vec<Value>>) -> Vec<String> {
    images
        .unwrap_or_default()
        .into_iter()
        .filter_map(|image| serde_json::from_value::<ImageObject>(image).ok())
        .map(|image| image.url)
        .collect()
}

/// Reads a field, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

async fn check_status(resp: Response, context: &str) -> Result<Response, CatalogError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.error.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "Unknown error".to_string());
    warn!(status = status.as_u16(), "{}: {}", context, message);

    let message = format!("{}: {}", context, message);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CatalogError::Auth(message)),
        _ => Err(CatalogError::Transport(message)),
    }
}

fn transport_error(context: &str, err: reqwest::Error) -> CatalogError {
    if err.is_timeout() {
        CatalogError::Transport(format!("{}: request timed out", context))
    } else {
        CatalogError::Transport(format!("{}: {}", context, err))
    }
}

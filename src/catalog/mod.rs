pub mod spotify;

use crate::session::{Credential, UserProfile};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use spotify::SpotifyClient;

/// The catalog API serves at most this many playlists per page.
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub images: Vec<String>,
}

/// The playlists that were loaded, plus how many the library holds.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PlaylistPage {
    pub playlists: Vec<Playlist>,
    pub total: u32,
    /// The catalog reported playlists beyond this page.
    pub has_more: bool,
}

impl PlaylistPage {
    /// A page that holds the whole library.
    pub fn complete(playlists: Vec<Playlist>) -> Self {
        Self {
            total: playlists.len() as u32,
            playlists,
            has_more: false,
        }
    }
}

/// One entry of a playlist, flattened for prompt construction. Every field is
/// absent when the catalog reports a removed or unavailable track.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Track {
    pub name: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Parse(String),
}

impl CatalogError {
    pub fn is_auth(&self) -> bool {
        matches!(self, CatalogError::Auth(_))
    }
}

impl Serialize for CatalogError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Read access to the user's music library.
pub trait Catalog: Send + Sync {
    /// First page of the user's playlists. Later pages are not fetched, but
    /// the page reports whether they exist.
    fn list_playlists<'a>(
        &'a self,
        token: &'a Credential,
    ) -> BoxFuture<'a, Result<PlaylistPage, CatalogError>>;

    fn list_tracks<'a>(
        &'a self,
        token: &'a Credential,
        playlist_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Track>, CatalogError>>;

    fn current_user<'a>(
        &'a self,
        token: &'a Credential,
    ) -> BoxFuture<'a, Result<UserProfile, CatalogError>>;
}

//! The chat flow: load playlists, pick one, send remix requests.
//!
//! Network work is split out of the state so a caller can drive it from an
//! event loop: `begin_*` validates and moves the state forward synchronously,
//! the returned job runs without borrowing the conversation, and
//! `complete_*` folds the outcome back in. Only one job can be in flight.

use crate::catalog::{Catalog, CatalogError, Playlist, PlaylistPage};
use crate::llm::{GenerateError, TextGenerator};
use crate::prompt::build_prompt;
use crate::session::{Credential, Session};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const PLAYLISTS_FAILED: &str = "Failed to load playlists. Please try again.";
pub const PLAYLISTS_AUTH_FAILED: &str = "Failed to load playlists. Please sign in again.";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PlaylistsLoading,
    Ready { selected: Option<String> },
    Submitting { playlist_id: String },
    Error(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RemixError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejected {
    #[error("type a remix request first")]
    EmptyInput,
    #[error("select a playlist first")]
    NoPlaylistSelected,
    #[error("a request is already in progress")]
    Busy,
    #[error("playlists are not loaded")]
    NotReady,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("playlists are not available right now")]
    NotReady,
    #[error("unknown playlist: {0}")]
    UnknownPlaylist(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActivationRejected {
    #[error("sign in to load playlists")]
    SignedOut,
    #[error("a request is already in progress")]
    Busy,
}

/// A playlist load that has been started and must be completed.
pub struct PendingActivation {
    catalog: Arc<dyn Catalog>,
    credential: Credential,
}

impl PendingActivation {
    pub async fn run(self) -> Result<PlaylistPage, CatalogError> {
        self.catalog.list_playlists(&self.credential).await
    }
}

/// A remix request that has been accepted and must be completed.
pub struct PendingSubmission {
    catalog: Arc<dyn Catalog>,
    generator: Arc<dyn TextGenerator>,
    credential: Option<Credential>,
    request: String,
    playlist_id: String,
}

impl PendingSubmission {
    pub fn request(&self) -> &str {
        &self.request
    }

    pub fn playlist_id(&self) -> &str {
        &self.playlist_id
    }

    /// Tracks, then prompt, then model. Stops at the first failure.
    pub async fn run(self) -> Result<String, RemixError> {
        let credential = self
            .credential
            .ok_or_else(|| CatalogError::Auth("Not signed in".to_string()))?;
        let tracks = self
            .catalog
            .list_tracks(&credential, &self.playlist_id)
            .await?;
        let prompt = build_prompt(&self.request, &tracks);
        let reply = self.generator.generate(&prompt).await?;
        Ok(reply)
    }
}

pub struct Conversation {
    catalog: Arc<dyn Catalog>,
    generator: Arc<dyn TextGenerator>,
    phase: Phase,
    playlists: Vec<Playlist>,
    // Library size when it exceeds the loaded page.
    unloaded_total: Option<u32>,
    messages: Vec<Message>,
    input: String,
    last_error: Option<String>,
    activation_error: Option<CatalogError>,
    // Selection to restore once a reload finishes.
    reload_selection: Option<String>,
}

impl Conversation {
    pub fn new(catalog: Arc<dyn Catalog>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            catalog,
            generator,
            phase: Phase::Idle,
            playlists: Vec::new(),
            unloaded_total: None,
            messages: Vec::new(),
            input: String::new(),
            last_error: None,
            activation_error: None,
            reload_selection: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    /// How many playlists the library holds, when only part of it was loaded.
    pub fn playlists_total(&self) -> Option<u32> {
        self.unloaded_total
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Transient indicator for the last failed submission.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Why the last playlist load failed, shown next to the selector.
    pub fn activation_error(&self) -> Option<&CatalogError> {
        self.activation_error.as_ref()
    }

    pub fn needs_sign_in(&self) -> bool {
        self.activation_error
            .as_ref()
            .map(CatalogError::is_auth)
            .unwrap_or(false)
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.phase,
            Phase::PlaylistsLoading | Phase::Submitting { .. }
        )
    }

    pub fn selected_playlist(&self) -> Option<&Playlist> {
        let id = match &self.phase {
            Phase::Ready { selected: Some(id) } => id,
            Phase::Submitting { playlist_id } => playlist_id,
            _ => return None,
        };
        self.playlists.iter().find(|p| &p.id == id)
    }

    pub fn begin_activation(
        &mut self,
        session: &Session,
    ) -> Result<PendingActivation, ActivationRejected> {
        if self.is_busy() {
            return Err(ActivationRejected::Busy);
        }
        let Some(credential) = session.current_token() else {
            self.phase = Phase::Idle;
            self.playlists.clear();
            self.unloaded_total = None;
            self.activation_error = None;
            self.reload_selection = None;
            return Err(ActivationRejected::SignedOut);
        };

        self.reload_selection = match &self.phase {
            Phase::Ready { selected } => selected.clone(),
            _ => None,
        };
        self.phase = Phase::PlaylistsLoading;
        Ok(PendingActivation {
            catalog: Arc::clone(&self.catalog),
            credential: credential.clone(),
        })
    }

    pub fn complete_activation(&mut self, result: Result<PlaylistPage, CatalogError>) {
        if self.phase != Phase::PlaylistsLoading {
            warn!("playlist load completed outside of loading state, ignoring");
            return;
        }

        match result {
            Ok(page) => {
                info!(count = page.playlists.len(), total = page.total, "playlists loaded");
                let previous = self.reload_selection.take();
                self.unloaded_total = page.has_more.then_some(page.total);
                self.playlists = page.playlists;
                let selected = previous.filter(|id| self.playlists.iter().any(|p| &p.id == id));
                self.activation_error = None;
                self.phase = Phase::Ready { selected };
            }
            Err(e) => {
                warn!("loading playlists failed: {}", e);
                self.reload_selection = None;
                let message = if e.is_auth() {
                    PLAYLISTS_AUTH_FAILED
                } else {
                    PLAYLISTS_FAILED
                };
                self.playlists.clear();
                self.unloaded_total = None;
                self.activation_error = Some(e);
                self.phase = Phase::Error(message.to_string());
            }
        }
    }

    pub async fn activate(&mut self, session: &Session) -> Result<(), ActivationRejected> {
        let pending = self.begin_activation(session)?;
        let result = pending.run().await;
        self.complete_activation(result);
        Ok(())
    }

    pub fn select_playlist(&mut self, playlist_id: &str) -> Result<&Playlist, SelectError> {
        if !matches!(self.phase, Phase::Ready { .. }) {
            return Err(SelectError::NotReady);
        }
        let Some(index) = self.playlists.iter().position(|p| p.id == playlist_id) else {
            return Err(SelectError::UnknownPlaylist(playlist_id.to_string()));
        };

        self.phase = Phase::Ready {
            selected: Some(playlist_id.to_string()),
        };
        Ok(&self.playlists[index])
    }

    /// Accepts the current input as a remix request. On rejection nothing
    /// changes.
    pub fn begin_submission(
        &mut self,
        session: &Session,
    ) -> Result<PendingSubmission, SubmitRejected> {
        let playlist_id = match &self.phase {
            Phase::Submitting { .. } | Phase::PlaylistsLoading => {
                return Err(SubmitRejected::Busy)
            }
            Phase::Idle | Phase::Error(_) => return Err(SubmitRejected::NotReady),
            Phase::Ready { selected: None } => return Err(SubmitRejected::NoPlaylistSelected),
            Phase::Ready {
                selected: Some(id),
            } => id.clone(),
        };
        if self.input.trim().is_empty() {
            return Err(SubmitRejected::EmptyInput);
        }

        let request = std::mem::take(&mut self.input);
        self.messages.push(Message::new(Role::User, request.clone()));
        self.phase = Phase::Submitting {
            playlist_id: playlist_id.clone(),
        };

        Ok(PendingSubmission {
            catalog: Arc::clone(&self.catalog),
            generator: Arc::clone(&self.generator),
            credential: session.current_token().cloned(),
            request,
            playlist_id,
        })
    }

    /// Appends exactly one assistant message and returns to `Ready`.
    pub fn complete_submission(&mut self, result: Result<String, RemixError>) -> Option<&Message> {
        let Phase::Submitting { playlist_id } = &self.phase else {
            warn!("submission completed while not submitting, ignoring");
            return None;
        };
        let selected = Some(playlist_id.clone());

        let message = match result {
            Ok(text) => {
                self.last_error = None;
                Message::new(Role::Assistant, text)
            }
            Err(e) => {
                warn!("remix request failed: {}", e);
                self.last_error = Some(format!("Failed to process your request: {}", e));
                Message::new(
                    Role::Assistant,
                    format!(
                        "I apologize, but I encountered an error: {}. Please try again or rephrase your request.",
                        e
                    ),
                )
            }
        };

        self.messages.push(message);
        self.phase = Phase::Ready { selected };
        self.messages.last()
    }

    pub async fn submit(&mut self, session: &Session) -> Result<&Message, SubmitRejected> {
        let pending = self.begin_submission(session)?;
        let result = pending.run().await;
        self.complete_submission(result)
            .ok_or(SubmitRejected::NotReady)
    }

    /// Ends the session: everything tied to the old credential is dropped.
    pub fn sign_out(&mut self) {
        self.phase = Phase::Idle;
        self.playlists.clear();
        self.unloaded_total = None;
        self.messages.clear();
        self.input.clear();
        self.last_error = None;
        self.activation_error = None;
        self.reload_selection = None;
    }
}

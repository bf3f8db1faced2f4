use crate::catalog::{Catalog, SpotifyClient};
use crate::config::AppConfig;
use crate::conversation::Conversation;
use crate::llm::{LlmClient, TextGenerator};
use crate::session::{Credential, Session};
use anyhow::Result;
use std::sync::Arc;

/// Everything the front end works with: one session and one conversation.
pub struct AppState {
    pub config: AppConfig,
    pub session: Session,
    pub conversation: Conversation,
    catalog: Arc<dyn Catalog>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let catalog: Arc<dyn Catalog> = Arc::new(SpotifyClient::new(&config.spotify())?);
        let generator: Arc<dyn TextGenerator> =
            Arc::new(LlmClient::new(config.provider(), config.request_timeout())?);
        Ok(Self::with_clients(config, catalog, generator))
    }

    pub fn with_clients(
        config: AppConfig,
        catalog: Arc<dyn Catalog>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let session = config
            .spotify_access_token
            .clone()
            .and_then(Credential::new)
            .map(Session::signed_in)
            .unwrap_or_default();
        Self {
            config,
            session,
            conversation: Conversation::new(Arc::clone(&catalog), generator),
            catalog,
        }
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }
}

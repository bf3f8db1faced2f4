use crate::config::{AppConfig, ProviderKind};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ai-dj", version, about = "Ask an AI DJ to remix your Spotify playlists")]
pub struct Cli {
    /// Path to a config.toml (defaults to the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Spotify access token to start signed in
    #[arg(long)]
    pub token: Option<String>,

    /// Language model provider: gemini, openai or ollama
    #[arg(long)]
    pub provider: Option<ProviderKind>,

    /// Model id, e.g. gemini-1.5-pro
    #[arg(long)]
    pub model: Option<String>,
}

impl Cli {
    /// Flags win over the config file and environment.
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(token) = &self.token {
            config.spotify_access_token = Some(token.clone());
        }
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "ai-dj",
            "--provider",
            "openai",
            "--model",
            "gpt-4.1",
            "--token",
            "abc",
        ]);
        let config = cli.apply(AppConfig::default());
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.model(), "gpt-4.1");
        assert_eq!(config.spotify_access_token.as_deref(), Some("abc"));
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!(Cli::try_parse_from(["ai-dj", "--provider", "bard"]).is_err());
    }
}

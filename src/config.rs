use crate::catalog::spotify::{SpotifyConfig, DEFAULT_BASE_URL as CATALOG_BASE_URL};
use crate::catalog::MAX_PAGE_SIZE;
use crate::llm::{gemini, openai, Provider};
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_CONFIG_PATH: &str = "AI_DJ_CONFIG_PATH";
const ENV_CATALOG_URL: &str = "AI_DJ_CATALOG_URL";
const ENV_ACCESS_TOKEN: &str = "SPOTIFY_ACCESS_TOKEN";
const ENV_PROVIDER: &str = "AI_DJ_PROVIDER";
const ENV_MODEL: &str = "AI_DJ_MODEL";
const ENV_TIMEOUT: &str = "AI_DJ_TIMEOUT_SECS";
const ENV_GEMINI_KEY: &str = "GEMINI_API_KEY";
const ENV_GEMINI_URL: &str = "GEMINI_BASE_URL";
const ENV_OPENAI_KEY: &str = "OPENAI_API_KEY";
const ENV_OPENAI_URL: &str = "OPENAI_BASE_URL";
const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => gemini::DEFAULT_MODEL,
            ProviderKind::OpenAi => openai::DEFAULT_MODEL,
            ProviderKind::Ollama => openai::DEFAULT_OLLAMA_MODEL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            other => bail!("unknown provider '{}': expected gemini, openai or ollama", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog_base_url: String,
    pub spotify_access_token: Option<String>,
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub ollama_host: String,
    pub request_timeout_secs: u64,
    pub playlist_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: CATALOG_BASE_URL.to_string(),
            spotify_access_token: None,
            provider: ProviderKind::Gemini,
            model: None,
            gemini_api_key: None,
            gemini_base_url: gemini::DEFAULT_BASE_URL.to_string(),
            openai_api_key: None,
            openai_base_url: openai::DEFAULT_BASE_URL.to_string(),
            ollama_host: openai::DEFAULT_OLLAMA_HOST.to_string(),
            request_timeout_secs: 30,
            playlist_limit: MAX_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    /// Defaults, then the config file, then the environment.
    pub fn load(path_override: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = path_override
            .map(Path::to_path_buf)
            .or_else(config_file_override);
        let partial = match explicit {
            Some(path) => read_config_file(&path, true)?,
            None => match Self::default_config_path() {
                Some(path) => read_config_file(&path, false)?,
                None => None,
            },
        };
        if let Some(partial) = partial {
            config.apply_partial(partial);
        }

        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ai-dj").join(CONFIG_FILE_NAME))
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn spotify(&self) -> SpotifyConfig {
        SpotifyConfig {
            base_url: self.catalog_base_url.clone(),
            playlist_limit: self.playlist_limit,
            timeout: self.request_timeout(),
        }
    }

    /// Missing keys are carried through as empty strings so the provider
    /// reports them when asked to generate.
    pub fn provider(&self) -> Provider {
        let model = self.model().to_string();
        match self.provider {
            ProviderKind::Gemini => Provider::Gemini(gemini::GeminiConfig {
                api_key: self.gemini_api_key.clone().unwrap_or_default(),
                base_url: self.gemini_base_url.clone(),
                model,
            }),
            ProviderKind::OpenAi => Provider::OpenAi(openai::OpenAiConfig {
                api_key: self.openai_api_key.clone().unwrap_or_default(),
                base_url: self.openai_base_url.clone(),
                model,
            }),
            ProviderKind::Ollama => Provider::ollama(self.ollama_host.clone(), model),
        }
    }

    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(url) = partial.catalog_base_url {
            self.catalog_base_url = url;
        }
        if let Some(token) = partial.spotify_access_token {
            self.spotify_access_token = non_blank(token);
        }
        if let Some(provider) = partial.provider {
            self.provider = provider;
        }
        if let Some(model) = partial.model {
            self.model = non_blank(model);
        }
        if let Some(key) = partial.gemini_api_key {
            self.gemini_api_key = non_blank(key);
        }
        if let Some(url) = partial.gemini_base_url {
            self.gemini_base_url = url;
        }
        if let Some(key) = partial.openai_api_key {
            self.openai_api_key = non_blank(key);
        }
        if let Some(url) = partial.openai_base_url {
            self.openai_base_url = url;
        }
        if let Some(host) = partial.ollama_host {
            self.ollama_host = host;
        }
        if let Some(secs) = partial.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(limit) = partial.playlist_limit {
            self.playlist_limit = limit;
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        // A blank value clears optional settings and is ignored for the rest.
        if let Some(value) = lookup(ENV_ACCESS_TOKEN) {
            self.spotify_access_token = non_blank(value);
        }
        if let Some(value) = lookup(ENV_GEMINI_KEY) {
            self.gemini_api_key = non_blank(value);
        }
        if let Some(value) = lookup(ENV_OPENAI_KEY) {
            self.openai_api_key = non_blank(value);
        }
        if let Some(value) = lookup(ENV_MODEL) {
            self.model = non_blank(value);
        }
        if let Some(value) = lookup(ENV_PROVIDER).and_then(non_blank) {
            self.provider = value.parse()?;
        }
        if let Some(value) = lookup(ENV_CATALOG_URL).and_then(non_blank) {
            self.catalog_base_url = value;
        }
        if let Some(value) = lookup(ENV_GEMINI_URL).and_then(non_blank) {
            self.gemini_base_url = value;
        }
        if let Some(value) = lookup(ENV_OPENAI_URL).and_then(non_blank) {
            self.openai_base_url = value;
        }
        if let Some(value) = lookup(ENV_OLLAMA_HOST).and_then(non_blank) {
            self.ollama_host = value;
        }
        if let Some(value) = lookup(ENV_TIMEOUT).and_then(non_blank) {
            self.request_timeout_secs = value
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", ENV_TIMEOUT))?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        self.playlist_limit = self.playlist_limit.clamp(1, MAX_PAGE_SIZE);
        Ok(())
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.trim().to_string())
    }
}

fn config_file_override() -> Option<PathBuf> {
    let value = env::var_os(ENV_CONFIG_PATH)?;
    if value.is_empty() {
        return None;
    }
    let path = PathBuf::from(value);
    if path.is_dir() {
        Some(path.join(CONFIG_FILE_NAME))
    } else {
        Some(path)
    }
}

/// A file the user named must exist; the default location is optional.
fn read_config_file(path: &Path, required: bool) -> Result<Option<PartialConfig>> {
    if !path.exists() {
        if required {
            bail!("config file {} does not exist", path.display());
        }
        return Ok(None);
    }
    read_partial(path).map(Some)
}

fn read_partial(path: &Path) -> Result<PartialConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let partial: PartialConfig =
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(partial)
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct PartialConfig {
    catalog_base_url: Option<String>,
    spotify_access_token: Option<String>,
    provider: Option<ProviderKind>,
    model: Option<String>,
    gemini_api_key: Option<String>,
    gemini_base_url: Option<String>,
    openai_api_key: Option<String>,
    openai_base_url: Option<String>,
    ollama_host: Option<String>,
    request_timeout_secs: Option<u64>,
    playlist_limit: Option<u32>,
}

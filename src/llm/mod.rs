pub mod gemini;
pub mod openai;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("{0}")]
    Config(String),
    #[error("Empty response from {0}")]
    EmptyResponse(String),
    #[error("{0}")]
    Provider(String),
}

impl Serialize for GenerateError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Turns one prompt into one reply.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerateError>>;
}

/// Configured text-generation backend: Gemini or an OpenAI-compatible server.
#[derive(Debug, Clone)]
pub enum Provider {
    Gemini(gemini::GeminiConfig),
    OpenAi(openai::OpenAiConfig),
    Ollama(openai::OpenAiConfig),
}

impl Provider {
    pub fn gemini(api_key: String, model: String) -> Self {
        Provider::Gemini(gemini::GeminiConfig {
            api_key,
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
            model,
        })
    }

    pub fn openai(api_key: String, model: String) -> Self {
        Provider::OpenAi(openai::OpenAiConfig {
            api_key,
            base_url: openai::DEFAULT_BASE_URL.to_string(),
            model,
        })
    }

    pub fn ollama(host: String, model: String) -> Self {
        Provider::Ollama(openai::OpenAiConfig {
            api_key: String::new(),
            base_url: format!("{}/v1", host.trim_end_matches('/')),
            model,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini(_) => "Gemini API",
            Provider::OpenAi(_) => "OpenAI API",
            Provider::Ollama(_) => "Ollama",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::Gemini(config) => &config.model,
            Provider::OpenAi(config) | Provider::Ollama(config) => &config.model,
        }
    }

    /// Fails fast when a hosted provider has no API key; nothing is sent.
    fn ensure_configured(&self) -> Result<(), GenerateError> {
        let missing = match self {
            Provider::Gemini(config) => config.api_key.trim().is_empty(),
            Provider::OpenAi(config) => config.api_key.trim().is_empty(),
            Provider::Ollama(_) => false,
        };
        if missing {
            let what = match self {
                Provider::Gemini(_) => "Gemini",
                _ => "OpenAI",
            };
            return Err(GenerateError::Config(format!(
                "{} API key is not configured",
                what
            )));
        }
        Ok(())
    }

    pub async fn generate(&self, http: &Client, prompt: &str) -> Result<String, GenerateError> {
        self.ensure_configured()?;
        debug!(provider = self.name(), model = self.model(), "generate request");

        let result = match self {
            Provider::Gemini(config) => gemini::generate(http, config, prompt).await,
            Provider::OpenAi(config) | Provider::Ollama(config) => {
                openai::generate(http, config, prompt, self.name()).await
            }
        };

        match result {
            Ok(text) if text.trim().is_empty() => {
                Err(GenerateError::EmptyResponse(self.name().to_string()))
            }
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(provider = self.name(), "generate failed: {}", e);
                Err(e)
            }
        }
    }
}

/// A [`Provider`] bound to an HTTP client with a request timeout.
pub struct LlmClient {
    provider: Provider,
    http: Client,
}

impl LlmClient {
    pub fn new(provider: Provider, timeout: Duration) -> Result<Self, GenerateError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerateError::Provider(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { provider, http })
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }
}

impl TextGenerator for LlmClient {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerateError>> {
        Box::pin(self.provider.generate(&self.http, prompt))
    }
}

pub(crate) fn request_error(err: reqwest::Error) -> GenerateError {
    if err.is_timeout() {
        GenerateError::Provider("request timed out".to_string())
    } else {
        GenerateError::Provider(format!("request failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = Provider::Gemini(gemini::GeminiConfig {
            api_key: "  ".into(),
            base_url: server.uri(),
            model: "gemini-1.5-pro".into(),
        });
        let client = LlmClient::new(provider, Duration::from_secs(5)).unwrap();

        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerateError::Config(_)));
        assert_eq!(err.to_string(), "Gemini API key is not configured");
        server.verify().await;
    }

    #[tokio::test]
    async fn openai_without_key_is_config_error() {
        let provider = Provider::openai(String::new(), "gpt-4o-mini".into());
        let client = LlmClient::new(provider, Duration::from_secs(5)).unwrap();
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, GenerateError::Config(_)));
    }

    #[test]
    fn ollama_needs_no_key() {
        let provider = Provider::ollama("http://localhost:11434/".into(), "llama3".into());
        assert!(provider.ensure_configured().is_ok());
        match provider {
            Provider::Ollama(config) => assert_eq!(config.base_url, "http://localhost:11434/v1"),
            other => panic!("unexpected provider {:?}", other),
        }
    }
}

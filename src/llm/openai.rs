use super::{request_error, GenerateError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorObject,
}

#[derive(Deserialize)]
struct OpenAiErrorObject {
    message: Option<String>,
}

pub async fn generate(
    http: &Client,
    config: &OpenAiConfig,
    prompt: &str,
    provider_name: &str,
) -> Result<String, GenerateError> {
    let body = OpenAiRequest {
        model: config.model.clone(),
        messages: vec![OpenAiMessage {
            role: "user".to_string(),
            content: Some(prompt.to_string()),
        }],
        stream: false,
    };

    let mut req = http
        .post(format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        ))
        .header("Content-Type", "application/json")
        .json(&body);

    if !config.api_key.is_empty() {
        req = req.header("Authorization", format!("Bearer {}", config.api_key));
    }

    let resp = req.send().await.map_err(request_error)?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<OpenAiErrorBody>(&text)
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or(text);
        return Err(GenerateError::Provider(format!(
            "{} error: {} - {}",
            provider_name, status, message
        )));
    }

    let text = resp.text().await.map_err(request_error)?;
    let data: OpenAiResponse = serde_json::from_str(&text).map_err(|e| {
        GenerateError::Provider(format!("malformed {} response: {}", provider_name, e))
    })?;

    Ok(data
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}

use super::{request_error, GenerateError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorObject,
}

#[derive(Deserialize)]
struct GeminiErrorObject {
    message: Option<String>,
}

fn build_request(prompt: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                text: Some(prompt.to_string()),
            }],
        }],
    }
}

/// Concatenated text of the first candidate, empty if there is none.
fn extract_text(data: GeminiResponse) -> Result<String, GenerateError> {
    let candidate = data.candidates.into_iter().next();
    if candidate.is_none() {
        if let Some(reason) = data.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GenerateError::Provider(format!(
                "Gemini API blocked the prompt: {}",
                reason
            )));
        }
    }

    Ok(candidate
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default())
}

pub async fn generate(
    http: &Client,
    config: &GeminiConfig,
    prompt: &str,
) -> Result<String, GenerateError> {
    let body = build_request(prompt);

    let resp = http
        .post(format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        ))
        .header("Content-Type", "application/json")
        .header("x-goog-api-key", &config.api_key)
        .json(&body)
        .send()
        .await
        .map_err(request_error)?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GeminiErrorBody>(&text)
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or(text);
        return Err(GenerateError::Provider(format!(
            "Gemini API error: {} - {}",
            status, message
        )));
    }

    let text = resp.text().await.map_err(request_error)?;
    let data: GeminiResponse = serde_json::from_str(&text)
        .map_err(|e| GenerateError::Provider(format!("malformed Gemini response: {}", e)))?;
    extract_text(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmClient, Provider, TextGenerator};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> LlmClient {
        let provider = Provider::Gemini(GeminiConfig {
            api_key: "test-key".into(),
            base_url: server.uri(),
            model: DEFAULT_MODEL.into(),
        });
        LlmClient::new(provider, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"parts": [{"text": "remix please"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Try a "}, {"text": "half-time drop."}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client_for(&server).generate("remix please").await.unwrap();
        assert_eq!(reply, "Try a half-time drop.");
    }

    #[tokio::test]
    async fn stalled_request_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"candidates": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let provider = Provider::Gemini(GeminiConfig {
            api_key: "test-key".into(),
            base_url: server.uri(),
            model: DEFAULT_MODEL.into(),
        });
        let client = LlmClient::new(provider, Duration::from_secs(1)).unwrap();

        let err = client.generate("x").await.unwrap_err();
        assert!(matches!(err, GenerateError::Provider(_)));
        assert_eq!(err.to_string(), "request timed out");
    }

    #[tokio::test]
    async fn no_candidates_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        assert!(matches!(err, GenerateError::EmptyResponse(_)));
        assert_eq!(err.to_string(), "Empty response from Gemini API");
    }

    #[tokio::test]
    async fn blocked_prompt_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        assert!(matches!(err, GenerateError::Provider(ref m) if m.contains("SAFETY")));
    }

    #[tokio::test]
    async fn api_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        assert_eq!(err.to_string(), "Gemini API error: 400 - API key not valid");
    }

    #[tokio::test]
    async fn malformed_payload_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate("x").await.unwrap_err();
        assert!(matches!(err, GenerateError::Provider(_)));
    }
}

use crate::config::AppConfig;

/// The active configuration, with secrets masked for display.
pub fn get_settings(config: &AppConfig) -> Vec<(&'static str, String)> {
    let unset = || "(not set)".to_string();
    vec![
        ("provider", config.provider.as_str().to_string()),
        ("model", config.model().to_string()),
        ("catalog_base_url", config.catalog_base_url.clone()),
        (
            "spotify_access_token",
            config.spotify_access_token.as_deref().map(mask).unwrap_or_else(unset),
        ),
        (
            "gemini_api_key",
            config.gemini_api_key.as_deref().map(mask).unwrap_or_else(unset),
        ),
        ("gemini_base_url", config.gemini_base_url.clone()),
        (
            "openai_api_key",
            config.openai_api_key.as_deref().map(mask).unwrap_or_else(unset),
        ),
        ("openai_base_url", config.openai_base_url.clone()),
        ("ollama_host", config.ollama_host.clone()),
        (
            "request_timeout_secs",
            config.request_timeout_secs.to_string(),
        ),
        ("playlist_limit", config.playlist_limit.to_string()),
    ]
}

// Mask secrets for display
fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}

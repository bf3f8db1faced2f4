use ai_dj_lib::commands::{chat, playlists, session};
use ai_dj_lib::config::AppConfig;
use ai_dj_lib::conversation::{Phase, Role, PLAYLISTS_AUTH_FAILED};
use ai_dj_lib::state::AppState;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEMINI_PATH: &str = "/v1beta/models/gemini-1.5-pro:generateContent";

fn config_for(server: &MockServer, gemini_key: Option<&str>) -> AppConfig {
    AppConfig {
        catalog_base_url: server.uri(),
        gemini_base_url: server.uri(),
        gemini_api_key: gemini_key.map(str::to_string),
        request_timeout_secs: 5,
        ..AppConfig::default()
    }
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "display_name": "Test DJ",
            "images": []
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .and(query_param("limit", "50"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "pl-chill", "name": "Chill Vibes", "images": [{"url": "https://i.scdn.co/a"}]},
                {"id": "pl-gym", "name": "Gym", "images": []}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/playlists/pl-chill/tracks"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"track": {"name": "Song A", "artists": [{"name": "Artist X"}], "album": {"name": "Alb"}}},
                {"track": null}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn sign_in_select_and_remix() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(header("x-goog-api-key", "gemini-key"))
        .and(body_string_contains("make it lofi"))
        .and(body_string_contains("Song A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "1. Slow to 80 BPM\n2. Add vinyl crackle"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut state = AppState::new(config_for(&server, Some("gemini-key"))).unwrap();
    let profile = session::sign_in(&mut state, "user-token").await.unwrap();
    assert_eq!(profile.display_name.as_deref(), Some("Test DJ"));

    let listed = playlists::list_playlists(&state).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].images, vec!["https://i.scdn.co/a".to_string()]);

    let selected = playlists::select_playlist(&mut state, "chill vibes").unwrap();
    assert_eq!(selected.id, "pl-chill");

    let reply = chat::send_message(&mut state, "make it lofi").await.unwrap();
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "1. Slow to 80 BPM\n2. Add vinyl crackle");

    let history = chat::get_messages(&state);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "make it lofi");
    assert!(state.conversation.last_error().is_none());
}

#[tokio::test]
async fn missing_model_key_never_calls_provider() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut state = AppState::new(config_for(&server, None)).unwrap();
    session::sign_in(&mut state, "user-token").await.unwrap();
    playlists::select_playlist(&mut state, "1").unwrap();

    let reply = chat::send_message(&mut state, "make it techno").await.unwrap();
    assert_eq!(
        reply.content,
        "I apologize, but I encountered an error: Gemini API key is not configured. Please try again or rephrase your request."
    );
    assert_eq!(
        state.conversation.last_error(),
        Some("Failed to process your request: Gemini API key is not configured")
    );
    assert_eq!(chat::get_messages(&state).len(), 2);
    assert!(matches!(state.conversation.phase(), Phase::Ready { .. }));
}

#[tokio::test]
async fn stalled_model_returns_to_ready_with_apology() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "candidates": [{"content": {"parts": [{"text": "too late"}]}}]
                }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut state = AppState::new(AppConfig {
        request_timeout_secs: 1,
        ..config_for(&server, Some("gemini-key"))
    })
    .unwrap();
    session::sign_in(&mut state, "user-token").await.unwrap();
    playlists::select_playlist(&mut state, "pl-chill").unwrap();

    let reply = chat::send_message(&mut state, "make it lofi").await.unwrap();
    assert_eq!(
        reply.content,
        "I apologize, but I encountered an error: request timed out. Please try again or rephrase your request."
    );
    assert_eq!(
        state.conversation.phase(),
        &Phase::Ready {
            selected: Some("pl-chill".to_string())
        }
    );
    assert_eq!(chat::get_messages(&state).len(), 2);
}

#[tokio::test]
async fn large_library_reports_total() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"display_name": null})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "pl-1", "name": "First"}],
            "total": 80,
            "next": "https://api.spotify.com/v1/me/playlists?offset=50&limit=50"
        })))
        .mount(&server)
        .await;

    let mut state = AppState::new(config_for(&server, Some("gemini-key"))).unwrap();
    session::sign_in(&mut state, "user-token").await.unwrap();

    assert_eq!(playlists::list_playlists(&state).unwrap().len(), 1);
    assert_eq!(state.conversation.playlists_total(), Some(80));
}

#[tokio::test]
async fn expired_token_blocks_playlist_selection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "message": "The access token expired"}
        })))
        .mount(&server)
        .await;

    let mut state = AppState::new(config_for(&server, Some("gemini-key"))).unwrap();
    session::sign_in(&mut state, "stale-token").await.unwrap();

    assert_eq!(
        playlists::list_playlists(&state).unwrap_err(),
        PLAYLISTS_AUTH_FAILED
    );
    assert!(state.conversation.needs_sign_in());
    assert!(playlists::select_playlist(&mut state, "1").is_err());
    assert!(chat::send_message(&mut state, "anything").await.is_err());
    assert!(chat::get_messages(&state).is_empty());
}

#[tokio::test]
async fn request_without_selection_is_ignored() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let mut state = AppState::new(config_for(&server, Some("gemini-key"))).unwrap();
    session::sign_in(&mut state, "user-token").await.unwrap();

    let err = chat::send_message(&mut state, "make it lofi").await.unwrap_err();
    assert_eq!(err, "select a playlist first");
    assert!(chat::get_messages(&state).is_empty());
    assert_eq!(state.conversation.input(), "");
}

#[tokio::test]
async fn sign_out_clears_session_and_chat() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
        })))
        .mount(&server)
        .await;

    let mut state = AppState::new(config_for(&server, Some("gemini-key"))).unwrap();
    session::sign_in(&mut state, "user-token").await.unwrap();
    playlists::select_playlist(&mut state, "pl-chill").unwrap();
    chat::send_message(&mut state, "more reverb").await.unwrap();

    session::sign_out(&mut state);
    assert!(!state.session.is_authenticated());
    assert!(chat::get_messages(&state).is_empty());
    assert!(playlists::list_playlists(&state).is_err());
}

#[tokio::test]
async fn blank_sign_in_token_is_rejected() {
    let server = MockServer::start().await;
    let mut state = AppState::new(config_for(&server, None)).unwrap();
    assert!(session::sign_in(&mut state, "   ").await.is_err());
    assert!(!state.session.is_authenticated());
}

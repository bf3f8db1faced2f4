use crate::catalog::Playlist;
use crate::conversation::Phase;
use crate::state::AppState;

pub async fn refresh_playlists(state: &mut AppState) -> Result<Vec<Playlist>, String> {
    state
        .conversation
        .activate(&state.session)
        .await
        .map_err(|e| e.to_string())?;
    list_playlists(state)
}

pub fn list_playlists(state: &AppState) -> Result<Vec<Playlist>, String> {
    match state.conversation.phase() {
        Phase::Error(message) => Err(message.clone()),
        Phase::Idle => Err("Sign in to see your playlists".to_string()),
        _ => Ok(state.conversation.playlists().to_vec()),
    }
}

/// Accepts a 1-based position, a playlist id, or a name (case-insensitive).
pub fn select_playlist(state: &mut AppState, arg: &str) -> Result<Playlist, String> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err("Usage: /select <number|id|name>".to_string());
    }

    let playlists = state.conversation.playlists();
    let by_position = arg
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| playlists.get(i));
    let found = by_position
        .or_else(|| playlists.iter().find(|p| p.id == arg))
        .or_else(|| playlists.iter().find(|p| p.name.eq_ignore_ascii_case(arg)))
        .map(|p| p.id.clone())
        .unwrap_or_else(|| arg.to_string());

    state
        .conversation
        .select_playlist(&found)
        .cloned()
        .map_err(|e| e.to_string())
}

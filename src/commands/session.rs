use crate::session::{Credential, UserProfile};
use crate::state::AppState;
use tracing::{info, warn};

/// Starts a fresh session with `token` and loads the user's playlists.
/// A failed profile lookup does not block sign-in.
pub async fn sign_in(state: &mut AppState, token: &str) -> Result<UserProfile, String> {
    let credential = Credential::new(token).ok_or("Access token is empty")?;

    state.conversation.sign_out();
    state.session.sign_in(credential);
    load_profile(state).await;

    state
        .conversation
        .activate(&state.session)
        .await
        .map_err(|e| e.to_string())?;
    info!("signed in");
    Ok(state.session.profile().clone())
}

pub async fn load_profile(state: &mut AppState) {
    let Some(token) = state.session.current_token().cloned() else {
        return;
    };
    let result = state.catalog().current_user(&token).await;
    match result {
        Ok(profile) => state.session.set_profile(profile),
        Err(e) => warn!("could not load user profile: {}", e),
    }
}

pub fn sign_out(state: &mut AppState) {
    state.session.sign_out();
    state.conversation.sign_out();
    info!("signed out");
}

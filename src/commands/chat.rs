use crate::conversation::Message;
use crate::state::AppState;

/// Sends a remix request for the selected playlist and returns the reply.
/// Failures from the catalog or the model come back as an apology message,
/// only a rejected submission is an `Err`.
pub async fn send_message(state: &mut AppState, content: &str) -> Result<Message, String> {
    state.conversation.set_input(content);
    let reply = state
        .conversation
        .submit(&state.session)
        .await
        .map(Message::clone);

    if reply.is_err() {
        // A rejected request leaves nothing queued behind.
        state.conversation.set_input(String::new());
    }
    reply.map_err(|e| e.to_string())
}

pub fn get_messages(state: &AppState) -> Vec<Message> {
    state.conversation.messages().to_vec()
}

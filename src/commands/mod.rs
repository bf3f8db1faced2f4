pub mod chat;
pub mod playlists;
pub mod session;
pub mod settings;

/// Slash commands offered for completion and listed by `/help`.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/playlists", "list your playlists"),
    ("/select", "select a playlist by number, id or name"),
    ("/refresh", "reload playlists"),
    ("/signin", "sign in with a Spotify access token"),
    ("/signout", "sign out and clear the conversation"),
    ("/settings", "show the active configuration"),
    ("/history", "show the conversation so far"),
    ("/help", "show this help"),
    ("/quit", "exit"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Playlists,
    Select(String),
    Refresh,
    SignIn(String),
    SignOut,
    Settings,
    History,
    Help,
    Quit,
    Remix(String),
    Unknown(String),
    Empty,
}

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Remix(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim().to_string()),
        None => (rest, String::new()),
    };
    match name.to_ascii_lowercase().as_str() {
        "playlists" | "ls" => Command::Playlists,
        "select" | "use" => Command::Select(arg),
        "refresh" => Command::Refresh,
        "signin" | "login" => Command::SignIn(arg),
        "signout" | "logout" => Command::SignOut,
        "settings" => Command::Settings,
        "history" => Command::History,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

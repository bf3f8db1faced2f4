use crate::commands::{self, Command, COMMANDS};
use crate::conversation::Phase;
use crate::state::AppState;
use crate::view;
use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::borrow::Cow::{self, Borrowed, Owned};

/// Completion, highlighting and hints for slash commands.
struct CliHelper {
    commands: Vec<&'static str>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|(name, _)| *name).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

enum Flow {
    Continue,
    Quit,
}

fn prompt(state: &AppState) -> String {
    match state.conversation.selected_playlist() {
        Some(playlist) => format!("[{}] › ", view::sanitize(&playlist.name)),
        None => "› ".to_string(),
    }
}

fn print_help() {
    println!("{}", "Type a remix request, e.g. \"make it lofi\", or a command:".bold());
    for (name, about) in COMMANDS {
        println!("  {:<12} {}", name.bright_cyan(), about);
    }
}

fn print_playlist_state(state: &AppState) {
    match commands::playlists::list_playlists(state) {
        Ok(playlists) => {
            let selected = state.conversation.selected_playlist().map(|p| p.id.as_str());
            view::print_playlists(&playlists, selected, state.conversation.playlists_total());
        }
        Err(message) => view::print_error(&message),
    }
}

async fn dispatch(state: &mut AppState, command: Command) -> Flow {
    match command {
        Command::Empty => {}
        Command::Quit => return Flow::Quit,
        Command::Help => print_help(),
        Command::Unknown(name) => {
            view::print_error(&format!("Unknown command /{}. Try /help.", name))
        }
        Command::Playlists => print_playlist_state(state),
        Command::Refresh => {
            if let Err(message) = commands::playlists::refresh_playlists(state).await {
                view::print_error(&message);
            } else {
                print_playlist_state(state);
            }
        }
        Command::Select(arg) => match commands::playlists::select_playlist(state, &arg) {
            Ok(playlist) => view::print_info(&format!(
                "Selected \"{}\"",
                view::sanitize(&playlist.name)
            )),
            Err(message) => view::print_error(&message),
        },
        Command::SignIn(token) => match commands::session::sign_in(state, &token).await {
            Ok(profile) => {
                view::print_profile(&profile);
                print_playlist_state(state);
            }
            Err(message) => view::print_error(&message),
        },
        Command::SignOut => {
            commands::session::sign_out(state);
            view::print_info("Signed out.");
        }
        Command::Settings => {
            for (key, value) in commands::settings::get_settings(&state.config) {
                println!("  {:<22} {}", key.dimmed(), value);
            }
        }
        Command::History => {
            for message in commands::chat::get_messages(state) {
                view::print_message(&message);
            }
        }
        Command::Remix(text) => {
            println!("{}", "Thinking…".dimmed());
            match commands::chat::send_message(state, &text).await {
                Ok(reply) => {
                    view::print_message(&reply);
                    if let Some(error) = state.conversation.last_error() {
                        view::print_error(error);
                    }
                }
                Err(message) => view::print_error(&message),
            }
        }
    }
    Flow::Continue
}

/// Signs in with the configured token (if any), loads playlists, then reads
/// commands until EOF or `/quit`.
pub async fn run(mut state: AppState) -> Result<()> {
    println!("{}", "AI DJ: ask the AI to remix your playlist in any style you want".bold());

    if state.session.is_authenticated() {
        commands::session::load_profile(&mut state).await;
        view::print_profile(state.session.profile());
        // Only SignedOut/Busy can be returned here and neither applies.
        let _ = state.conversation.activate(&state.session).await;
        print_playlist_state(&state);
    } else {
        view::print_info("Not signed in. Use /signin <access token> to connect Spotify.");
    }
    if matches!(state.conversation.phase(), Phase::Ready { selected: None }) {
        view::print_info("Pick a playlist with /select <number>, then describe your remix.");
    }

    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    loop {
        match rl.readline(&prompt(&state)) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                if let Flow::Quit = dispatch(&mut state, commands::parse(&line)).await {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

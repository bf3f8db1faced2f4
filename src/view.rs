use crate::catalog::Playlist;
use crate::conversation::{Message, Role};
use crate::render::{render, Block};
use crate::session::UserProfile;
use colored::Colorize;
use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").unwrap());

/// Drops control characters so model output cannot drive the terminal.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// `**text**` spans become bold; everything else is printed as-is.
pub fn style_inline(text: &str) -> String {
    BOLD.replace_all(text, |caps: &regex::Captures| caps[1].bold().to_string())
        .into_owned()
}

pub fn format_blocks(blocks: &[Block]) -> String {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        let formatted = match block {
            Block::Paragraph(text) => style_inline(text),
            Block::Bullets(items) => items
                .iter()
                .map(|item| format!("  • {}", style_inline(item)))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Numbered(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("  {}. {}", i + 1, style_inline(item)))
                .collect::<Vec<_>>()
                .join("\n"),
        };
        out.push(formatted);
    }
    out.join("\n\n")
}

pub fn print_message(message: &Message) {
    let text = sanitize(&message.content);
    match message.role {
        Role::User => println!("{} {}", "you ›".bright_cyan().bold(), text),
        Role::Assistant => {
            println!("{}", "dj ›".bright_green().bold());
            println!("{}", format_blocks(&render(&text)));
        }
    }
    println!();
}

/// Only the first page is loaded; say so when the library is larger.
pub fn partial_library_notice(shown: usize, total: Option<u32>) -> Option<String> {
    let total = total?;
    (total as usize > shown).then(|| {
        format!(
            "Showing {} of {} playlists. Only the first page is loaded.",
            shown, total
        )
    })
}

pub fn print_playlists(playlists: &[Playlist], selected: Option<&str>, total: Option<u32>) {
    if playlists.is_empty() {
        println!("{}", "No playlists found.".dimmed());
        return;
    }
    for (i, playlist) in playlists.iter().enumerate() {
        let name = if playlist.name.is_empty() {
            "(untitled)".dimmed().to_string()
        } else {
            sanitize(&playlist.name)
        };
        if selected == Some(playlist.id.as_str()) {
            println!("{} {:>2}. {}", "▶".green(), i + 1, name.green().bold());
        } else {
            println!("  {:>2}. {}", i + 1, name);
        }
    }
    if let Some(notice) = partial_library_notice(playlists.len(), total) {
        println!("{}", notice.dimmed());
    }
}

pub fn print_profile(profile: &UserProfile) {
    match &profile.display_name {
        Some(name) => println!("{} {}", "Signed in as".dimmed(), sanitize(name).bold()),
        None => println!("{}", "Signed in.".dimmed()),
    }
}

pub fn print_info(text: &str) {
    println!("{}", text.bright_yellow());
}

/// Errors can carry response bodies from remote services.
pub fn format_error(text: &str) -> String {
    sanitize(text).red().to_string()
}

pub fn print_error(text: &str) {
    eprintln!("{}", format_error(text));
}

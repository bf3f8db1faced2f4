//! Splits an assistant reply into display blocks.
//!
//! Text is only segmented and labelled, never interpreted as markup.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\.\s*(.*)$").unwrap());

const BULLET: &str = "- ";

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum Block {
    Paragraph(String),
    Bullets(Vec<String>),
    Numbered(Vec<String>),
}

pub fn render(text: &str) -> Vec<Block> {
    split_blocks(text)
        .into_iter()
        .map(|lines| classify(&lines))
        .collect()
}

/// Groups non-blank lines, breaking at blank lines.
fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn classify(lines: &[&str]) -> Block {
    if lines.iter().all(|l| l.trim_start().starts_with(BULLET)) {
        return Block::Bullets(
            lines
                .iter()
                .map(|l| l.trim_start()[BULLET.len()..].trim().to_string())
                .collect(),
        );
    }

    // Only the first line decides; a "2." further down a paragraph is text.
    if NUMBERED.is_match(lines[0]) {
        let mut items: Vec<String> = Vec::new();
        for line in lines {
            match NUMBERED.captures(line) {
                Some(caps) => items.push(caps[2].trim().to_string()),
                None => {
                    // Continuation of the previous item.
                    if let Some(last) = items.last_mut() {
                        if !last.is_empty() {
                            last.push(' ');
                        }
                        last.push_str(line.trim());
                    }
                }
            }
        }
        return Block::Numbered(items);
    }

    Block::Paragraph(
        lines
            .iter()
            .map(|l| l.trim())
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

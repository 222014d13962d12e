//! Destructive-operation detection.
//!
//! Heuristic keyword scan over an operation name or free text. A hit means
//! the operation may cause irreversible data loss and must pass the strict
//! typed confirmation plus credential check, whatever the operating mode.

/// Words that mark an operation as destructive wherever they appear.
pub const DESTRUCTIVE_KEYWORDS: &[&str] = &[
    "delete", "remove", "erase", "wipe", "format", "truncate", "destroy",
];

/// Shell-style commands that only count as a whole token.
pub const DESTRUCTIVE_COMMANDS: &[&str] = &["rm", "rmdir", "del", "rd", "shred"];

/// Return every destructive marker found in `text`.
pub fn destructive_markers(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    let mut found = Vec::new();

    for &keyword in DESTRUCTIVE_KEYWORDS {
        if lowered.contains(keyword) {
            found.push(keyword);
        }
    }

    let tokens: Vec<&str> = lowered
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .collect();
    for &command in DESTRUCTIVE_COMMANDS {
        if tokens.contains(&command) {
            found.push(command);
        }
    }

    found
}

pub fn is_destructive(text: &str) -> bool {
    !destructive_markers(text).is_empty()
}

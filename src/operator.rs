//! Operator interaction: the prompts the gateway needs from a human.
//!
//! The gateway never touches stdin directly. It asks an [`Operator`] for a
//! yes/no answer, a typed confirmation token, or a PIN, so tests can drive
//! it with a scripted operator and other front-ends can supply their own.

use rustyline::completion::Completer;
use rustyline::config::{ColorMode, Config as EditorConfig};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Editor, Helper};
use std::borrow::Cow;
use std::io::{self, Write};

#[cfg_attr(test, mockall::automock)]
pub trait Operator {
    /// Ask a yes/no question. Anything but `y`/`yes` is a refusal.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Require the operator to type `token` exactly.
    fn confirm_strict(&mut self, prompt: &str, token: &str) -> bool;

    /// Read a secret without echoing it. `None` means the operator
    /// cancelled entry.
    fn read_secret(&mut self, prompt: &str) -> Option<String>;

    /// Show a status line to the operator.
    fn notify(&mut self, message: &str);
}

/// Console-backed operator: prompts on stdout, answers on stdin.
#[derive(Debug, Default)]
pub struct ConsoleOperator;

impl ConsoleOperator {
    pub fn new() -> Self {
        Self
    }

    fn read_line(prompt: &str) -> Option<String> {
        let mut stdout = io::stdout();
        print!("{}", prompt);
        stdout.flush().ok()?;

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => None,
            Ok(_) => Some(input.trim().to_string()),
            Err(e) => {
                tracing::warn!("Failed to read operator input: {}", e);
                None
            }
        }
    }
}

impl Operator for ConsoleOperator {
    fn confirm(&mut self, prompt: &str) -> bool {
        Self::read_line(&format!("{} (y/n): ", prompt))
            .map(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false)
    }

    fn confirm_strict(&mut self, prompt: &str, token: &str) -> bool {
        Self::read_line(&format!("{} Type {} to proceed: ", prompt, token))
            .map(|answer| answer == token)
            .unwrap_or(false)
    }

    fn read_secret(&mut self, prompt: &str) -> Option<String> {
        let config = EditorConfig::builder()
            .color_mode(ColorMode::Forced)
            .auto_add_history(false)
            .build();

        let mut editor: Editor<MaskingHelper, DefaultHistory> = match Editor::with_config(config) {
            Ok(editor) => editor,
            Err(e) => {
                tracing::warn!("Secret prompt unavailable: {}", e);
                return None;
            }
        };
        editor.set_helper(Some(MaskingHelper));

        match editor.readline(prompt) {
            Ok(line) => Some(line.trim().to_string()),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => None,
            Err(e) => {
                tracing::warn!("Failed to read secret: {}", e);
                None
            }
        }
    }

    fn notify(&mut self, message: &str) {
        println!("{}", message);
    }
}

/// Rustyline helper that renders every typed character as `*`.
struct MaskingHelper;

impl Highlighter for MaskingHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned("*".repeat(line.chars().count()))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

impl Completer for MaskingHelper {
    type Candidate = String;
}

impl Hinter for MaskingHelper {
    type Hint = String;
}

impl Validator for MaskingHelper {}

impl Helper for MaskingHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_hides_every_character() {
        let helper = MaskingHelper;
        assert_eq!(helper.highlight("4821", 4), "****");
        assert_eq!(helper.highlight("", 0), "");
    }
}

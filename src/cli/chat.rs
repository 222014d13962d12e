//! CLI subcommand: `jarvis chat`
//!
//! Interactive loop. Each line is `<intent> [text]` or a slash command.

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use super::setup::ensure_setup;
use crate::actions::{ActionDispatcher, ContextEntry, NOT_UNDERSTOOD};
use crate::commands::{self, Surface};
use crate::config::Config;
use crate::operator::ConsoleOperator;
use crate::security::CredentialStore;

pub fn run() -> Result<()> {
    let config = Config::load()?;

    let store = CredentialStore::new(config.paths.credential_file());
    ensure_setup(
        &store,
        &mut ConsoleOperator::new(),
        config.security.effective_iterations(),
    )?;

    let mut dispatcher = ActionDispatcher::from_config(&config);

    println!(
        "Jarvis v{} | Mode: {}\n",
        env!("CARGO_PKG_VERSION"),
        dispatcher.gateway().mode()
    );
    println!("Type /help for commands, /quit to leave\n");

    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline("You: ");

        let input = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                break; // Ctrl+D
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let _ = rl.add_history_entry(input);

        if input.starts_with('/') {
            match commands::find_slash(input).map(|cmd| cmd.name) {
                Some("help") => println!("\n{}\n", commands::format_help_text(Surface::Chat)),
                Some("context") => {
                    let context = dispatcher.context();
                    println!("\nCurrent:  {}", describe(context.current()));
                    println!("Previous: {}\n", describe(context.previous()));
                }
                Some("mode") => println!("\n{}\n", dispatcher.mode_report()),
                Some("lock") => println!("\n{}\n", dispatcher.lock()),
                Some("quit") => break,
                _ => eprintln!("Unknown command: {}. Type /help for commands.", input),
            }
            continue;
        }

        let (word, text) = input
            .split_once(char::is_whitespace)
            .unwrap_or((input, ""));
        let reply = match commands::find_intent(word) {
            Some(cmd) => dispatcher.route(cmd.name, text),
            None => format!("{} Type /help for intents.", NOT_UNDERSTOOD),
        };
        println!("\nJarvis: {}\n", reply);

        if dispatcher.should_exit() {
            break;
        }
    }

    Ok(())
}

fn describe(entry: Option<&ContextEntry>) -> String {
    match entry {
        Some(entry) => format!("{} {}", entry.kind.as_str(), entry.target),
        None => "(empty)".to_string(),
    }
}

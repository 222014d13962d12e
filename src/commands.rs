//! Intent and slash command definitions shared by `jarvis chat` and `jarvis run`.

/// Which front-ends accept a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Chat,
    Run,
}

/// An intent or slash command definition.
pub struct Command {
    pub name: &'static str,
    pub description: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub surfaces: &'static [Surface],
}

impl Command {
    pub fn supports(&self, surface: Surface) -> bool {
        self.surfaces.contains(&surface)
    }

    pub fn matches(&self, word: &str) -> bool {
        self.name == word || self.aliases.contains(&word)
    }

    /// Format as a help line, e.g. "  open_app, open <app>  - Open an application"
    fn help_line(&self, prefix: &str) -> String {
        let mut names = format!("{}{}", prefix, self.name);
        for alias in self.aliases {
            names.push_str(&format!(", {}{}", prefix, alias));
        }
        if !self.usage.is_empty() {
            names.push_str(&format!(" {}", self.usage));
        }
        format!("  {:<34}- {}", names, self.description)
    }
}

const BOTH: &[Surface] = &[Surface::Chat, Surface::Run];

pub const INTENTS: &[Command] = &[
    Command {
        name: "greeting",
        description: "Say hello",
        aliases: &["hello", "hi"],
        usage: "",
        surfaces: BOTH,
    },
    Command {
        name: "time",
        description: "Tell the current time",
        aliases: &["clock"],
        usage: "",
        surfaces: BOTH,
    },
    Command {
        name: "open_app",
        description: "Open an application",
        aliases: &["open", "launch"],
        usage: "<app>",
        surfaces: BOTH,
    },
    Command {
        name: "open_website",
        description: "Open a website",
        aliases: &["browse", "website"],
        usage: "<site>",
        surfaces: BOTH,
    },
    Command {
        name: "close_app",
        description: "Close an app by name, or the last opened one",
        aliases: &["close"],
        usage: "[app]",
        surfaces: BOTH,
    },
    Command {
        name: "close_last",
        description: "Close the app opened last",
        aliases: &["close_it"],
        usage: "",
        surfaces: &[Surface::Chat],
    },
    Command {
        name: "open_again",
        description: "Reopen the last app or website",
        aliases: &["reopen", "again"],
        usage: "",
        surfaces: BOTH,
    },
    Command {
        name: "exit",
        description: "Shut the assistant down",
        aliases: &["bye", "shutdown"],
        usage: "",
        surfaces: &[Surface::Chat],
    },
    Command {
        name: "create_folder",
        description: "Create a folder",
        aliases: &["mkdir"],
        usage: "<path>",
        surfaces: BOTH,
    },
    Command {
        name: "create_file",
        description: "Create a file with optional content",
        aliases: &["touch"],
        usage: "<path> [content]",
        surfaces: BOTH,
    },
    Command {
        name: "move",
        description: "Move a file or folder",
        aliases: &["mv"],
        usage: "<from> to <to>",
        surfaces: BOTH,
    },
    Command {
        name: "rename",
        description: "Rename a file or folder in place",
        aliases: &[],
        usage: "<path> to <new name>",
        surfaces: BOTH,
    },
    Command {
        name: "list_dir",
        description: "List a folder",
        aliases: &["ls", "list"],
        usage: "<path>",
        surfaces: BOTH,
    },
    Command {
        name: "delete",
        description: "Delete a file or folder",
        aliases: &["remove"],
        usage: "<path>",
        surfaces: BOTH,
    },
    Command {
        name: "set_mode",
        description: "Switch between normal and pro mode",
        aliases: &[],
        usage: "<normal|pro>",
        surfaces: BOTH,
    },
    Command {
        name: "mode",
        description: "Show the operating mode",
        aliases: &[],
        usage: "",
        surfaces: BOTH,
    },
    Command {
        name: "allow_directory",
        description: "Allow file operations inside a directory",
        aliases: &["allow"],
        usage: "<dir>",
        surfaces: BOTH,
    },
];

pub const SLASH_COMMANDS: &[Command] = &[
    Command {
        name: "help",
        description: "Show available commands",
        aliases: &["h", "?"],
        usage: "",
        surfaces: &[Surface::Chat],
    },
    Command {
        name: "context",
        description: "Show the current and previous action",
        aliases: &[],
        usage: "",
        surfaces: &[Surface::Chat],
    },
    Command {
        name: "mode",
        description: "Show the operating mode",
        aliases: &[],
        usage: "",
        surfaces: &[Surface::Chat],
    },
    Command {
        name: "lock",
        description: "Forget the PIN session",
        aliases: &[],
        usage: "",
        surfaces: &[Surface::Chat],
    },
    Command {
        name: "quit",
        description: "Leave chat without the exit gate",
        aliases: &["q"],
        usage: "",
        surfaces: &[Surface::Chat],
    },
];

/// Look up an intent by name or alias, case-insensitively.
pub fn find_intent(word: &str) -> Option<&'static Command> {
    let word = word.trim().to_lowercase();
    INTENTS.iter().find(|cmd| cmd.matches(&word))
}

/// Canonical intent name for `word`, if it names one.
pub fn canonical_intent(word: &str) -> Option<&'static str> {
    find_intent(word).map(|cmd| cmd.name)
}

/// Look up a slash command; `input` may include the leading `/`.
pub fn find_slash(input: &str) -> Option<&'static Command> {
    let word = input.trim().trim_start_matches('/').to_lowercase();
    SLASH_COMMANDS.iter().find(|cmd| cmd.matches(&word))
}

/// Format help text for a given surface.
pub fn format_help_text(surface: Surface) -> String {
    let mut lines = vec!["Intents:".to_string()];
    for cmd in INTENTS {
        if cmd.supports(surface) {
            lines.push(cmd.help_line(""));
        }
    }

    if surface == Surface::Chat {
        lines.push(String::new());
        lines.push("Commands:".to_string());
        for cmd in SLASH_COMMANDS {
            lines.push(cmd.help_line("/"));
        }
    }
    lines.join("\n")
}

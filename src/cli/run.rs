//! CLI subcommand: `jarvis run <intent> [text...]`

use anyhow::Result;
use clap::Args;

use crate::actions::ActionDispatcher;
use crate::commands::{self, Surface};
use crate::config::Config;

#[derive(Args)]
pub struct RunArgs {
    /// Intent name or alias (see `jarvis chat` and /help)
    pub intent: String,

    /// Free text passed to the intent
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub text: Vec<String>,
}

pub fn run(args: RunArgs) -> Result<()> {
    let Some(command) = commands::find_intent(&args.intent) else {
        anyhow::bail!(
            "Unknown intent: {}\n\n{}",
            args.intent,
            commands::format_help_text(Surface::Run)
        );
    };
    if !command.supports(Surface::Run) {
        anyhow::bail!("Intent {} is only available in `jarvis chat`", command.name);
    }

    let config = Config::load()?;
    let mut dispatcher = ActionDispatcher::from_config(&config);
    println!("{}", dispatcher.route(command.name, &args.text.join(" ")));
    Ok(())
}

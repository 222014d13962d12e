//! CLI subcommand: `jarvis mode`

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::Config;
use crate::operator::ConsoleOperator;
use crate::security::VerificationGateway;
use crate::state::OperatingMode;

#[derive(Args)]
pub struct ModeArgs {
    #[command(subcommand)]
    pub command: ModeCommands,
}

#[derive(Subcommand)]
pub enum ModeCommands {
    /// Show the current operating mode
    Show,

    /// Change the operating mode (requires the PIN)
    Set {
        /// normal or pro
        mode: OperatingMode,
    },
}

pub fn run(args: ModeArgs) -> Result<()> {
    let config = Config::load()?;
    let mut gateway = VerificationGateway::from_config(&config);

    match args.command {
        ModeCommands::Show => {
            println!("{}", gateway.mode());
        }
        ModeCommands::Set { mode } => {
            let mut operator = ConsoleOperator::new();
            if gateway.set_mode(&mut operator, mode)? {
                println!("Mode set to {}.", mode);
            } else {
                println!("Mode unchanged ({}).", gateway.mode());
            }
        }
    }

    Ok(())
}

pub mod audit;
pub mod chat;
pub mod config;
pub mod mode;
pub mod paths;
pub mod run;
pub mod sandbox;
pub mod setup;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jarvis")]
#[command(author, version, about = "A local assistant with a trust-gated action gateway")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive session
    Chat,

    /// Route a single intent and print the reply
    Run(run::RunArgs),

    /// Create or reset the PIN
    Setup(setup::SetupArgs),

    /// Show or change the operating mode
    Mode(mode::ModeArgs),

    /// Manage the file-operation sandbox
    Sandbox(sandbox::SandboxArgs),

    /// Inspect the activity audit log
    Audit(audit::AuditArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Show resolved XDG directory paths
    Paths,
}

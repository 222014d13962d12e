use anyhow::Result;
use clap::{Args, Subcommand};

use crate::config::Config;
use crate::operator::ConsoleOperator;
use crate::security::{VerificationGateway, normalize_path};

#[derive(Args)]
pub struct SandboxArgs {
    #[command(subcommand)]
    pub command: SandboxCommands,
}

#[derive(Subcommand)]
pub enum SandboxCommands {
    /// Show allowed and protected paths
    List,

    /// Allow file operations inside a directory (requires the PIN)
    Allow {
        /// Directory to allow
        path: String,
    },

    /// Check whether a path is inside the sandbox
    Check {
        /// Path to check
        path: String,
    },
}

pub fn run(args: SandboxArgs) -> Result<()> {
    let config = Config::load()?;
    let mut gateway = VerificationGateway::from_config(&config);

    match args.command {
        SandboxCommands::List => {
            let policy = gateway.sandbox().policy();
            println!("Sandbox: {}", gateway.sandbox().path().display());
            println!();
            println!("Allowed:");
            if policy.allowed_paths.is_empty() {
                println!("  (none, every file operation is denied)");
            }
            for path in &policy.allowed_paths {
                println!("  {}", path.display());
            }
            println!();
            println!("Protected:");
            for path in &policy.protected_paths {
                println!("  {}", path);
            }
        }
        SandboxCommands::Allow { path } => {
            let mut operator = ConsoleOperator::new();
            if gateway.allow_directory(&mut operator, &path)? {
                println!("Allowed.");
            } else {
                println!("Not changed.");
            }
        }
        SandboxCommands::Check { path } => {
            let verdict = if gateway.sandbox().is_path_allowed(&path) {
                "allowed"
            } else {
                "denied"
            };
            match normalize_path(&path) {
                Some(normalized) => println!("{}: {}", normalized.display(), verdict),
                None => println!("(empty): {}", verdict),
            }
        }
    }

    Ok(())
}

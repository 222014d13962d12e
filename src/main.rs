use anyhow::Result;
use clap::Parser;

use jarvis::Config;
use jarvis::cli::{self, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins, then --verbose, then [logging] level from the config file
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        Config::configured_log_level().unwrap_or_else(|| "info".to_string())
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat => cli::chat::run(),
        Commands::Run(args) => cli::run::run(args),
        Commands::Setup(args) => cli::setup::run(args),
        Commands::Mode(args) => cli::mode::run(args),
        Commands::Sandbox(args) => cli::sandbox::run(args),
        Commands::Audit(args) => cli::audit::run(args),
        Commands::Config(args) => cli::config::run(args),
        Commands::Paths => cli::paths::run(),
    }
}

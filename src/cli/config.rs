//! CLI subcommand: `jarvis config`
//!
//! `show` prints the file as written plus what Jarvis actually uses: the
//! clamped security values and the app/website registry after merging
//! `[apps]` and `[websites]` over the built-ins.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use serde_json::{Value, json};

use crate::actions::Registry;
use crate::config::{Config, DEFAULT_CONFIG_TEMPLATE};
use crate::paths::Paths;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration and the effective settings derived from it
    Show {
        #[arg(short, long, value_enum, default_value_t = ShowFormat::Toml)]
        format: ShowFormat,
    },

    /// Get a value by dotted key (e.g. security.session_ttl_secs, websites.docs)
    Get { key: String },

    /// Set a value by dotted key; range checks apply
    Set { key: String, value: String },

    /// Print the config file path
    Path,

    /// Write the commented default config and create the data directories
    Init {
        /// Replace an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    Toml,
    Json,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show { format } => {
            let config = Config::load()?;
            println!("{}", render_show(&config, format)?);
            Ok(())
        }
        ConfigCommands::Get { key } => {
            println!("{}", Config::load()?.get_value(&key)?);
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load()?;
            config.set_value(&key, &value)?;
            config.save()?;
            tracing::info!("Config {} updated", key);
            println!("{} = {}", key, config.get_value(&key)?);
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
        ConfigCommands::Init { force } => {
            let paths = Paths::resolve()?;
            for line in init(&paths, force)? {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

/// Values Jarvis runs with after clamping, plus the merged registry.
pub fn effective_settings(config: &Config) -> Value {
    let registry = Registry::from_config(config);
    let apps: Vec<Value> = registry
        .apps()
        .iter()
        .map(|app| {
            json!({
                "name": app.name,
                "launch": app.launch_command,
                "closable": app.termination_handle.is_some(),
            })
        })
        .collect();
    let websites: Vec<Value> = registry
        .websites()
        .iter()
        .map(|site| json!({ "name": site.name, "url": site.url }))
        .collect();

    json!({
        "session_ttl_secs": config.security.session_ttl().num_seconds(),
        "pbkdf2_iterations": config.security.effective_iterations(),
        "max_auth_attempts": config.security.max_auth_attempts.max(1),
        "apps": apps,
        "websites": websites,
    })
}

fn render_show(config: &Config, format: ShowFormat) -> Result<String> {
    let effective = effective_settings(config);
    match format {
        ShowFormat::Json => Ok(serde_json::to_string_pretty(&json!({
            "config": config,
            "effective": effective,
        }))?),
        ShowFormat::Toml => {
            let mut out = toml::to_string_pretty(config)?;
            out.push_str("\n# Effective settings\n");
            out.push_str(&format!(
                "# session ttl: {}s, pbkdf2 iterations: {}, attempts: {}\n",
                effective["session_ttl_secs"],
                effective["pbkdf2_iterations"],
                effective["max_auth_attempts"]
            ));
            out.push_str("# apps:\n");
            for app in effective["apps"].as_array().into_iter().flatten() {
                let close = if app["closable"] == true { "" } else { " (cannot close)" };
                out.push_str(&format!(
                    "#   {} -> {}{}\n",
                    app["name"].as_str().unwrap_or_default(),
                    app["launch"].as_str().unwrap_or_default(),
                    close
                ));
            }
            out.push_str("# websites:\n");
            for site in effective["websites"].as_array().into_iter().flatten() {
                out.push_str(&format!(
                    "#   {} -> {}\n",
                    site["name"].as_str().unwrap_or_default(),
                    site["url"].as_str().unwrap_or_default()
                ));
            }
            Ok(out)
        }
    }
}

/// Write the template config and report where every Jarvis file lives.
fn init(paths: &Paths, force: bool) -> Result<Vec<String>> {
    let config_file = paths.config_file();
    if config_file.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_file.display()
        );
    }

    paths.ensure_dirs()?;
    crate::paths::atomic_write(&config_file, DEFAULT_CONFIG_TEMPLATE.as_bytes())?;

    Ok(vec![
        format!("Created config file at {}", config_file.display()),
        format!("PIN record:     {}", paths.credential_file().display()),
        format!("Sandbox policy: {}", paths.security_file().display()),
        format!("Mode and state: {}", paths.app_state_file().display()),
        format!("Audit log:      {}", paths.audit_log().display()),
        "Run `jarvis setup` to create a PIN.".to_string(),
    ])
}

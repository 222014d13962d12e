//! CLI subcommand: `jarvis paths`
//!
//! Prints all resolved XDG-compliant paths for debugging and scripting.

use anyhow::Result;

use crate::paths::Paths;

pub fn run() -> Result<()> {
    let paths = Paths::resolve()?;

    println!("Jarvis Paths (XDG Base Directory)");
    println!("==================================");
    println!();
    println!("Config:     {}", paths.config_dir.display());
    println!("  config.toml:    {}", paths.config_file().display());
    println!();
    println!("Data:       {}", paths.data_dir.display());
    println!("  credentials:    {}", paths.credential_file().display());
    println!("  sandbox:        {}", paths.security_file().display());
    println!();
    println!("State:      {}", paths.state_dir.display());
    println!("  app state:      {}", paths.app_state_file().display());
    println!("  audit log:      {}", paths.audit_log().display());

    Ok(())
}

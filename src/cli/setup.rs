//! CLI subcommand: `jarvis setup`
//!
//! First-run PIN creation and PIN reset.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::config::Config;
use crate::operator::{ConsoleOperator, Operator};
use crate::security::{AuditStatus, CredentialStore, SecretError, VerificationGateway};

#[derive(Args)]
pub struct SetupArgs {
    /// Replace an existing PIN (requires the current one)
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: SetupArgs) -> Result<()> {
    let config = Config::load()?;
    let mut gateway = VerificationGateway::from_config(&config);
    let mut operator = ConsoleOperator::new();

    if gateway.credentials().has_secret() {
        if !args.force {
            println!("A PIN is already configured. Use --force to reset it.");
            return Ok(());
        }
        if !gateway.require_auth(&mut operator, "Reset PIN.") {
            gateway
                .audit()
                .record("set_secret", AuditStatus::Denied, json!({ "reason": "auth_failed" }));
            anyhow::bail!("PIN reset denied");
        }
    }

    let store = gateway.credentials().clone();
    set_secret_interactive(&store, &mut operator, config.security.effective_iterations())?;
    gateway
        .audit()
        .record("set_secret", AuditStatus::Ok, json!({}));
    Ok(())
}

/// Offer to create a PIN when none exists. Returns whether one is set
/// afterwards.
pub fn ensure_setup(
    store: &CredentialStore,
    operator: &mut dyn Operator,
    iterations: u32,
) -> Result<bool> {
    if store.has_secret() {
        return Ok(true);
    }

    if !operator.confirm("No PIN is configured. Create one now?") {
        operator.notify("Actions that need a PIN will be denied until you run `jarvis setup`.");
        return Ok(false);
    }

    set_secret_interactive(store, operator, iterations)?;
    Ok(true)
}

/// Prompt for a PIN and its confirmation until they are valid and match.
/// Cancelling either prompt aborts setup.
pub fn set_secret_interactive(
    store: &CredentialStore,
    operator: &mut dyn Operator,
    iterations: u32,
) -> Result<()> {
    loop {
        let Some(candidate) = operator.read_secret("New PIN (4-8 digits): ") else {
            anyhow::bail!("PIN setup cancelled");
        };
        let Some(confirmation) = operator.read_secret("Confirm PIN: ") else {
            anyhow::bail!("PIN setup cancelled");
        };

        match store.set_secret(&candidate, &confirmation, iterations) {
            Ok(()) => {
                operator.notify("PIN saved.");
                return Ok(());
            }
            Err(e @ (SecretError::Format | SecretError::Mismatch)) => {
                operator.notify(&e.to_string());
            }
            Err(SecretError::Store(e)) => return Err(e),
        }
    }
}

//! CLI subcommand: `jarvis audit`
//!
//! Read-only view of the activity log. Corrupted lines are skipped.

use anyhow::Result;
use clap::Args;

use crate::paths::Paths;
use crate::security::{AuditRecord, AuditStatus, read_audit_log};

#[derive(Args)]
pub struct AuditArgs {
    /// Print raw JSON lines
    #[arg(long)]
    pub json: bool,

    /// Only records with this status (ok, denied, error, not_running)
    #[arg(long)]
    pub status: Option<AuditStatus>,

    /// Only records for this action (e.g. open_app, file_op_denied)
    #[arg(long)]
    pub action: Option<String>,

    /// Show at most this many of the newest records
    #[arg(short = 'n', long, default_value_t = 50)]
    pub limit: usize,
}

pub fn run(args: AuditArgs) -> Result<()> {
    let paths = Paths::resolve()?;
    let records = read_audit_log(&paths.audit_log())?;
    let selected = filter_records(records, args.status, args.action.as_deref(), args.limit);

    if selected.is_empty() {
        println!("No audit records.");
        return Ok(());
    }

    for record in &selected {
        if args.json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            println!("{}", format_record(record));
        }
    }
    Ok(())
}

/// Apply filters, then keep the newest `limit` records in log order.
pub fn filter_records(
    records: Vec<AuditRecord>,
    status: Option<AuditStatus>,
    action: Option<&str>,
    limit: usize,
) -> Vec<AuditRecord> {
    let mut selected: Vec<AuditRecord> = records
        .into_iter()
        .filter(|r| status.is_none_or(|s| r.status == s))
        .filter(|r| action.is_none_or(|a| r.action == a))
        .collect();

    if selected.len() > limit {
        selected.drain(..selected.len() - limit);
    }
    selected
}

fn format_record(record: &AuditRecord) -> String {
    let details = if record.details.is_empty() {
        String::new()
    } else {
        serde_json::Value::Object(record.details.clone()).to_string()
    };
    format!(
        "{}  {:<11} {:<18} {}",
        record.ts,
        record.status.as_str(),
        record.action,
        details
    )
}

//! Verification gateway: the policy engine every side effect passes through.
//!
//! Combines the operating mode, the action's risk, destructiveness, sandbox
//! membership, and the credential session into a single allow/deny answer.
//! Every branch appends an audit record before the answer is returned, and
//! evaluation stops at the first failing check.
//!
//! The operating mode and the sandbox policy are read from disk for each
//! decision, so changes made by another `jarvis` process apply at once.
//!
//! Callers only ever see the boolean. Denial reasons (`path_not_allowed`,
//! `destructive_not_confirmed`, `auth_failed`, `user_rejected`) go to the
//! audit log and nowhere else.
//!
//! | Mode | Risk | Prompts |
//! |------|------|---------|
//! | normal | low | confirm |
//! | normal | medium/high | confirm, PIN |
//! | pro | low | none |
//! | pro | medium/high | confirm, PIN |

use anyhow::Result;
use chrono::Duration;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::audit::{AuditLog, AuditStatus};
use super::credentials::CredentialStore;
use super::destructive::is_destructive;
use super::sandbox::{SandboxStore, normalize_path};
use super::session::{Authenticator, Clock};
use crate::config::{Config, SecurityConfig};
use crate::operator::Operator;
use crate::paths::Paths;
use crate::state::{AppStateStore, OperatingMode};

/// File operations that need a PIN even when not destructive.
const AUTH_FILE_OPS: &[&str] = &["move", "rename"];

/// Coarse classification of how much friction a system action needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Risk {
    Low,
    Medium,
    High,
}

impl Risk {
    /// Parse a risk label. Anything unrecognised is treated as low.
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "medium" => Risk::Medium,
            "high" => Risk::High,
            _ => Risk::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Risk::Low => "low",
            Risk::Medium => "medium",
            Risk::High => "high",
        }
    }

    pub fn is_elevated(&self) -> bool {
        !matches!(self, Risk::Low)
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct VerificationGateway {
    auth: Authenticator,
    sandbox: SandboxStore,
    state: AppStateStore,
    audit: AuditLog,
    session_ttl: Duration,
    strict_token: String,
}

impl VerificationGateway {
    pub fn new(paths: &Paths, security: &SecurityConfig) -> Self {
        let state = AppStateStore::new(paths.app_state_file());
        let auth = Authenticator::new(CredentialStore::new(paths.credential_file()))
            .with_max_attempts(security.max_auth_attempts);

        debug!("Gateway starting in {} mode", state.mode());
        Self {
            auth,
            sandbox: SandboxStore::load(paths.security_file()),
            state,
            audit: AuditLog::new(paths.audit_log()),
            session_ttl: security.session_ttl(),
            strict_token: security.strict_confirm_token.clone(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.paths, &config.security)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.auth = self.auth.with_clock(clock);
        self
    }

    /// Persisted operating mode.
    pub fn mode(&self) -> OperatingMode {
        self.state.mode()
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn sandbox(&self) -> &SandboxStore {
        &self.sandbox
    }

    pub fn state_store(&self) -> &AppStateStore {
        &self.state
    }

    pub fn credentials(&self) -> &CredentialStore {
        self.auth.credentials()
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    /// PIN check with the configured session lifetime.
    pub fn require_auth(&mut self, operator: &mut dyn Operator, reason: &str) -> bool {
        self.auth.require_auth(operator, reason, self.session_ttl)
    }

    /// Forget the PIN session so the next gated call prompts again.
    pub fn end_session(&mut self) {
        self.auth.end_session();
        info!("Session ended");
    }

    /// Gate an operation that reads `source` and writes `target`, such as
    /// a move. Both paths must be inside the sandbox.
    pub fn verify_file_transfer(
        &mut self,
        operator: &mut dyn Operator,
        operation: &str,
        source: &str,
        target: &str,
    ) -> bool {
        self.reload_sandbox();
        if !self.sandbox.is_path_allowed(source) {
            let details = json!({ "op": operation, "path": source, "to": target });
            return self.block_path(operator, &details);
        }
        self.verify_file_operation(operator, operation, target)
    }

    /// Gate a file operation of kind `operation` on `target`.
    pub fn verify_file_operation(
        &mut self,
        operator: &mut dyn Operator,
        operation: &str,
        target: &str,
    ) -> bool {
        let details = json!({ "op": operation, "path": target });

        self.reload_sandbox();
        if !self.sandbox.is_path_allowed(target) {
            return self.block_path(operator, &details);
        }

        if is_destructive(operation) {
            let prompt = format!("This looks destructive ({}). Are you absolutely sure?", operation);
            if !operator.confirm_strict(&prompt, &self.strict_token) {
                return self.deny("file_op_denied", &details, "destructive_not_confirmed");
            }
            if !self.require_auth(operator, "Destructive file operation.") {
                return self.deny("file_op_denied", &details, "auth_failed");
            }
        }

        if self.mode() == OperatingMode::Normal {
            let prompt = format!("Proceed with file operation '{}' on {}?", operation, target);
            if !operator.confirm(&prompt) {
                return self.deny("file_op_denied", &details, "user_rejected");
            }
        }

        // Move and rename need a PIN in both modes.
        if AUTH_FILE_OPS.contains(&operation)
            && !self.require_auth(operator, "File operation authorization.")
        {
            return self.deny("file_op_denied", &details, "auth_failed");
        }

        self.allow("file_op_allowed", details)
    }

    /// Gate a system action such as launching or terminating a process.
    pub fn verify_system_action(
        &mut self,
        operator: &mut dyn Operator,
        action: &str,
        risk: Risk,
    ) -> bool {
        let details = json!({ "action": action, "risk": risk.as_str() });

        let prompt = match self.mode() {
            OperatingMode::Normal => format!("About to execute: {}. Proceed?", action),
            OperatingMode::Pro if !risk.is_elevated() => {
                return self.allow("sys_action_allowed", details);
            }
            OperatingMode::Pro => format!(
                "[{}] Execute: {}?",
                risk.as_str().to_uppercase(),
                action
            ),
        };

        if !operator.confirm(&prompt) {
            return self.deny("sys_action_denied", &details, "user_rejected");
        }

        if risk.is_elevated() && !self.require_auth(operator, "System action authorization.") {
            return self.deny("sys_action_denied", &details, "auth_failed");
        }

        self.allow("sys_action_allowed", details)
    }

    /// Strict confirmation when `text` looks destructive; true without
    /// prompting otherwise.
    pub fn verify_destructive_text(&mut self, operator: &mut dyn Operator, text: &str) -> bool {
        if !is_destructive(text) {
            return true;
        }

        let details = json!({ "action": text, "risk": Risk::High.as_str() });
        let prompt = format!("This looks destructive ({}). Are you absolutely sure?", text);
        if !operator.confirm_strict(&prompt, &self.strict_token) {
            return self.deny("sys_action_denied", &details, "destructive_not_confirmed");
        }
        self.allow("sys_action_allowed", details)
    }

    /// Change the operating mode. Always requires a PIN; a denial leaves
    /// the persisted mode untouched.
    pub fn set_mode(&mut self, operator: &mut dyn Operator, mode: OperatingMode) -> Result<bool> {
        let details = json!({ "mode": mode.as_str() });

        if !self.require_auth(operator, &format!("Change mode to {}.", mode)) {
            self.deny("set_mode", &details, "auth_failed");
            return Ok(false);
        }

        if let Err(e) = self.state.persist_mode(mode) {
            self.audit.record("set_mode", AuditStatus::Error, details);
            return Err(e);
        }

        info!("Operating mode set to {}", mode);
        self.audit.record("set_mode", AuditStatus::Ok, details);
        Ok(true)
    }

    /// Grow the sandbox allow-list. Requires a PIN. Blank paths are
    /// rejected before any prompt.
    pub fn allow_directory(&mut self, operator: &mut dyn Operator, path: &str) -> Result<bool> {
        let Some(normalized) = normalize_path(path) else {
            return Ok(false);
        };
        let details = json!({ "path": normalized.display().to_string() });

        if !self.require_auth(operator, &format!("Allow file operations in {}.", normalized.display())) {
            self.deny("sandbox_allow", &details, "auth_failed");
            return Ok(false);
        }

        self.reload_sandbox();
        match self.sandbox.add_allowed_directory(path) {
            Ok(added) => {
                self.audit.record("sandbox_allow", AuditStatus::Ok, details);
                Ok(added)
            }
            Err(e) => {
                self.audit.record("sandbox_allow", AuditStatus::Error, details);
                Err(e)
            }
        }
    }

    fn reload_sandbox(&mut self) {
        self.sandbox = SandboxStore::load(self.sandbox.path().to_path_buf());
    }

    fn block_path(&self, operator: &mut dyn Operator, details: &Value) -> bool {
        operator.notify("Operation blocked: path is not in allowed directories.");
        operator.notify("Tip: allow the directory first with `jarvis sandbox allow <dir>`.");
        self.deny("file_op_denied", details, "path_not_allowed")
    }

    fn allow(&self, action: &str, details: Value) -> bool {
        debug!("Gate allowed {}: {}", action, details);
        self.audit.record(action, AuditStatus::Ok, details);
        true
    }

    fn deny(&self, action: &str, details: &Value, reason: &str) -> bool {
        let mut details = details.clone();
        if let Value::Object(map) = &mut details {
            map.insert("reason".to_string(), Value::from(reason));
        }
        info!("Gate denied {} ({})", action, reason);
        self.audit.record(action, AuditStatus::Denied, details);
        false
    }
}

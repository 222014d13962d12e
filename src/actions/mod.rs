//! Action dispatcher: the concrete gated operations.
//!
//! Each operation resolves its target, asks the [`VerificationGateway`],
//! performs the effect only when allowed, updates the action context and
//! the durable "last opened" pointer, and returns a message for the
//! operator. Nothing here returns an error to the caller:
//!
//! - a gate denial becomes a cancellation message,
//! - a resolution miss becomes a "not found" message with no gate call and
//!   no audit record,
//! - an effect failure becomes a failure message plus an `error` or
//!   `not_running` audit record.

mod context;
mod files;
mod launcher;
mod registry;

pub use context::{ActionContext, ActionKind, ContextEntry};
pub use launcher::{ActionError, Launcher, SystemLauncher};
pub use registry::{AppDescriptor, Registry, WebsiteDescriptor};

#[cfg(test)]
pub use launcher::MockLauncher;

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::commands;
use crate::config::Config;
use crate::operator::{ConsoleOperator, Operator};
use crate::security::{AuditStatus, Risk, VerificationGateway};
use crate::state::{LastOpened, OperatingMode, TargetKind};

pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that.";
const CANCELLED: &str = "Cancelled.";

/// Intents whose text is a path. The file-operation gate judges those.
const PATH_INTENTS: &[&str] = &[
    "create_folder",
    "create_file",
    "move",
    "rename",
    "list_dir",
    "delete",
    "allow_directory",
];

/// Maps free text to an intent name and a confidence in `[0, 1]`.
pub trait IntentClassifier {
    fn classify(&self, text: &str) -> Option<(String, f32)>;
}

/// A resolved open target, whichever registry it came from.
struct OpenTarget {
    kind: TargetKind,
    name: String,
    launch: String,
}

impl From<&AppDescriptor> for OpenTarget {
    fn from(app: &AppDescriptor) -> Self {
        Self {
            kind: TargetKind::App,
            name: app.name.clone(),
            launch: app.launch_command.clone(),
        }
    }
}

impl From<&WebsiteDescriptor> for OpenTarget {
    fn from(site: &WebsiteDescriptor) -> Self {
        Self {
            kind: TargetKind::Website,
            name: site.name.clone(),
            launch: site.url.clone(),
        }
    }
}

pub struct ActionDispatcher {
    gateway: VerificationGateway,
    operator: Box<dyn Operator>,
    launcher: Box<dyn Launcher>,
    registry: Registry,
    context: ActionContext,
    min_confidence: f32,
    shutdown_requested: bool,
}

impl ActionDispatcher {
    pub fn new(
        gateway: VerificationGateway,
        operator: Box<dyn Operator>,
        launcher: Box<dyn Launcher>,
        registry: Registry,
    ) -> Self {
        Self {
            gateway,
            operator,
            launcher,
            registry,
            context: ActionContext::new(),
            min_confidence: 0.0,
            shutdown_requested: false,
        }
    }

    /// Console operator, system launcher, and registries from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            VerificationGateway::from_config(config),
            Box::new(ConsoleOperator::new()),
            Box::new(SystemLauncher),
            Registry::from_config(config),
        )
        .with_min_confidence(config.intent.min_confidence)
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn context(&self) -> &ActionContext {
        &self.context
    }

    pub fn gateway(&self) -> &VerificationGateway {
        &self.gateway
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// True once the exit intent has been allowed.
    pub fn should_exit(&self) -> bool {
        self.shutdown_requested
    }

    /// Single entry point for front-ends. Unknown intents get the
    /// "didn't understand" reply. Free text that reads as destructive
    /// needs the strict confirmation before any other intent runs.
    pub fn route(&mut self, intent: &str, text: &str) -> String {
        let Some(intent) = commands::canonical_intent(intent) else {
            return NOT_UNDERSTOOD.to_string();
        };
        let text = text.trim();

        if !PATH_INTENTS.contains(&intent)
            && !self
                .gateway
                .verify_destructive_text(self.operator.as_mut(), text)
        {
            return CANCELLED.to_string();
        }

        match intent {
            "greeting" => greeting(),
            "time" => current_time(),
            "open_app" => self.open_app(text),
            "open_website" => self.open_website(text),
            "close_app" if text.is_empty() => self.close_last(),
            "close_app" => self.close_by_name(text),
            "close_last" => self.close_last(),
            "open_again" => self.reopen_last(),
            "exit" => self.exit(),
            "create_folder" => self.create_folder(text),
            "create_file" => {
                let (path, content) = split_path_and_rest(text);
                self.create_file(path, content)
            }
            "move" => match split_pair(text) {
                Some((from, to)) => self.move_path(from, to),
                None => "Tell me what to move and where, e.g. `a.txt to b.txt`.".to_string(),
            },
            "rename" => match split_pair(text) {
                Some((path, new_name)) => self.rename(path, new_name),
                None => "Tell me what to rename and the new name.".to_string(),
            },
            "list_dir" => self.list_dir(text),
            "delete" => self.delete(text),
            "set_mode" => self.set_mode(text),
            "mode" => self.mode_report(),
            "allow_directory" => self.allow_directory(text),
            _ => NOT_UNDERSTOOD.to_string(),
        }
    }

    /// Classify `text` and route it when the classifier is confident enough.
    pub fn handle_text(&mut self, classifier: &dyn IntentClassifier, text: &str) -> String {
        match classifier.classify(text) {
            Some((intent, confidence)) if confidence >= self.min_confidence => {
                self.route(&intent, text)
            }
            Some((intent, confidence)) => {
                info!(
                    "Ignoring intent {} below threshold ({:.2} < {:.2})",
                    intent, confidence, self.min_confidence
                );
                NOT_UNDERSTOOD.to_string()
            }
            None => NOT_UNDERSTOOD.to_string(),
        }
    }

    pub fn open_app(&mut self, text: &str) -> String {
        match self.registry.resolve_app(text).map(OpenTarget::from) {
            Some(target) => self.open_target(target, false),
            None => "Application not found.".to_string(),
        }
    }

    pub fn open_website(&mut self, text: &str) -> String {
        match self.registry.resolve_website(text).map(OpenTarget::from) {
            Some(target) => self.open_target(target, false),
            None => "Website not found.".to_string(),
        }
    }

    /// Close the app named by the current context slot.
    pub fn close_last(&mut self) -> String {
        let name = match self.context.current() {
            Some(entry) if entry.kind == ActionKind::OpenApp => entry.target.clone(),
            _ => return "I don't know what to close.".to_string(),
        };
        let Some(app) = self.registry.app(&name) else {
            return "Closing this application is not supported.".to_string();
        };
        let Some(handle) = app.termination_handle.clone() else {
            return "Cannot determine how to close this app.".to_string();
        };
        self.close_app(&name, &handle)
    }

    /// Close the first registry app named in `text`.
    pub fn close_by_name(&mut self, text: &str) -> String {
        let Some(app) = self.registry.resolve_app(text) else {
            return "I couldn't find the application to close.".to_string();
        };
        let name = app.name.clone();
        let Some(handle) = app.termination_handle.clone() else {
            return "Cannot determine how to close this app.".to_string();
        };
        self.close_app(&name, &handle)
    }

    /// Reopen the current context target, falling back to the durable
    /// "last opened" pointer.
    pub fn reopen_last(&mut self) -> String {
        let (kind, name) = match self.context.current() {
            Some(entry) => (entry.kind.target_kind(), entry.target.clone()),
            None => match self.gateway.state_store().last_opened() {
                Some(LastOpened { kind, name }) => (kind, name),
                None => return "I don't know what to open again.".to_string(),
            },
        };

        let target = match kind {
            TargetKind::App => self.registry.app(&name).map(OpenTarget::from),
            TargetKind::Website => self.registry.website(&name).map(OpenTarget::from),
        };
        match (target, kind) {
            (Some(target), _) => self.open_target(target, true),
            (None, TargetKind::App) => "I can't reopen that app.".to_string(),
            (None, TargetKind::Website) => "I can't reopen that website.".to_string(),
        }
    }

    /// Medium-risk gate; on allow, request shutdown. The caller's loop
    /// decides when to actually stop.
    pub fn exit(&mut self) -> String {
        if !self
            .gateway
            .verify_system_action(self.operator.as_mut(), "exit application", Risk::Medium)
        {
            return "Exit cancelled.".to_string();
        }
        self.audit("exit", AuditStatus::Ok, json!({}));
        self.shutdown_requested = true;
        info!("Shutdown requested");
        "Shutting down.".to_string()
    }

    /// `set_mode` intent: text mentioning "pro" selects pro, anything else
    /// normal.
    pub fn set_mode(&mut self, text: &str) -> String {
        let mode = if text.to_lowercase().contains("pro") {
            OperatingMode::Pro
        } else {
            OperatingMode::Normal
        };

        match self.gateway.set_mode(self.operator.as_mut(), mode) {
            Ok(true) => format!("Mode set to {}.", mode),
            Ok(false) => "Mode unchanged.".to_string(),
            Err(e) => {
                warn!("Mode change failed: {:#}", e);
                format!("Failed to change mode: {}", e)
            }
        }
    }

    /// Forget the PIN session; the next gated action prompts again.
    pub fn lock(&mut self) -> String {
        self.gateway.end_session();
        "Session locked.".to_string()
    }

    pub fn mode_report(&self) -> String {
        format!("Current mode: {}.", self.gateway.mode())
    }

    pub fn allow_directory(&mut self, text: &str) -> String {
        if text.is_empty() {
            return "Please specify a directory.".to_string();
        }
        match self.gateway.allow_directory(self.operator.as_mut(), text) {
            Ok(true) => format!("File operations allowed in {}.", text),
            Ok(false) => "Operation cancelled.".to_string(),
            Err(e) => {
                warn!("Sandbox update failed: {:#}", e);
                format!("Failed to update sandbox: {}", e)
            }
        }
    }

    fn open_target(&mut self, target: OpenTarget, again: bool) -> String {
        let verb = if again { "reopen" } else { "open" };
        let description = format!("{} {} {}", verb, target.kind.as_str(), target.name);
        if !self
            .gateway
            .verify_system_action(self.operator.as_mut(), &description, Risk::Low)
        {
            return CANCELLED.to_string();
        }

        let (audit_action, details) = match (again, target.kind) {
            (true, kind) => (
                "open_again",
                json!({ "type": kind.as_str(), "name": target.name }),
            ),
            (false, TargetKind::App) => ("open_app", json!({ "name": target.name })),
            (false, TargetKind::Website) => ("open_website", json!({ "name": target.name })),
        };

        let launched = match target.kind {
            TargetKind::App => self.launcher.launch(&target.launch),
            TargetKind::Website => self.launcher.open_url(&target.launch),
        };
        if let Err(e) = launched {
            warn!("Failed to open {}: {}", target.name, e);
            self.audit(audit_action, AuditStatus::Error, with_error(details, &e));
            return format!("Failed to open {}.", target.name);
        }

        self.context
            .set(ActionKind::opening(target.kind), target.name.clone());
        let pointer = LastOpened::new(target.kind, target.name.clone());
        if let Err(e) = self.gateway.state_store().set_last_opened(&pointer) {
            warn!("Failed to persist last opened target: {:#}", e);
        }
        self.audit(audit_action, AuditStatus::Ok, details);

        if again {
            format!("Opening {} again.", target.name)
        } else {
            format!("Opening {}.", target.name)
        }
    }

    fn close_app(&mut self, name: &str, handle: &str) -> String {
        if !self.gateway.verify_system_action(
            self.operator.as_mut(),
            &format!("close app {}", name),
            Risk::Low,
        ) {
            return CANCELLED.to_string();
        }

        let details = json!({ "name": name });
        match self.launcher.terminate(handle) {
            Ok(()) => {
                self.context.clear_current();
                self.audit("close_app", AuditStatus::Ok, details);
                format!("Closed {}.", name)
            }
            Err(ActionError::NotRunning) => {
                self.audit("close_app", AuditStatus::NotRunning, details);
                format!("{} is not running.", name)
            }
            Err(e) => {
                warn!("Failed to close {}: {}", name, e);
                self.audit("close_app", AuditStatus::Error, with_error(details, &e));
                format!("Failed to close {}.", name)
            }
        }
    }

    fn audit(&self, action: &str, status: AuditStatus, details: Value) {
        self.gateway.audit().record(action, status, details);
    }
}

fn greeting() -> String {
    "Hello! How can I help you?".to_string()
}

fn current_time() -> String {
    chrono::Local::now()
        .format("Current time is %H:%M:%S")
        .to_string()
}

fn with_error(mut details: Value, error: &dyn std::fmt::Display) -> Value {
    if let Value::Object(map) = &mut details {
        map.insert("error".to_string(), Value::from(error.to_string()));
    }
    details
}

const QUOTES: [char; 2] = ['"', '\''];

/// Split `"<path> <rest>"`. A path wrapped in quotes may contain spaces;
/// otherwise it ends at the first whitespace.
fn split_path_and_rest(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    for quote in QUOTES {
        if let Some((path, rest)) = text
            .strip_prefix(quote)
            .and_then(|inner| inner.split_once(quote))
        {
            return (path, rest.trim_start());
        }
    }
    match text.split_once(char::is_whitespace) {
        Some((path, rest)) => (path, rest.trim_start()),
        None => (text, ""),
    }
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    for quote in QUOTES {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

/// Split `"<a> to <b>"`, or `"<a> <b>"` when there is no ` to `. Either
/// side may be quoted.
fn split_pair(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    let (a, b) = match text.split_once(" to ") {
        Some((a, b)) if !text.starts_with(QUOTES) => (unquote(a), unquote(b)),
        _ => {
            let (a, rest) = split_path_and_rest(text);
            let rest = rest.strip_prefix("to ").unwrap_or(rest);
            (a, unquote(rest))
        }
    };
    if a.is_empty() || b.is_empty() {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::operator::MockOperator;
    use crate::paths::Paths;
    use crate::security::{AuditRecord, CredentialStore};
    use crate::state::AppStateStore;
    use mockall::predicate::eq;

    pub(crate) struct Harness {
        pub(crate) tmp: tempfile::TempDir,
        pub(crate) paths: Paths,
    }

    impl Harness {
        pub(crate) fn new(mode: OperatingMode) -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let paths = Paths::under(tmp.path());
            CredentialStore::new(paths.credential_file())
                .set_secret("1234", "1234", 1_000)
                .unwrap();
            AppStateStore::new(paths.app_state_file())
                .persist_mode(mode)
                .unwrap();
            Self { tmp, paths }
        }

        pub(crate) fn dispatcher(&self, operator: MockOperator, launcher: MockLauncher) -> ActionDispatcher {
            ActionDispatcher::new(
                VerificationGateway::new(&self.paths, &SecurityConfig::default()),
                Box::new(operator),
                Box::new(launcher),
                Registry::builtin(),
            )
        }

        pub(crate) fn records(&self) -> Vec<AuditRecord> {
            crate::security::read_audit_log(&self.paths.audit_log()).unwrap()
        }

        /// Records written by the dispatcher itself, not the gate.
        pub(crate) fn effect_records(&self) -> Vec<AuditRecord> {
            self.records()
                .into_iter()
                .filter(|r| !r.action.starts_with("sys_action") && !r.action.starts_with("file_op"))
                .collect()
        }
    }

    /// Operator that approves every yes/no prompt.
    pub(crate) fn approving() -> MockOperator {
        let mut op = MockOperator::new();
        op.expect_confirm().returning(|_| true);
        op.expect_notify().returning(|_| ());
        op
    }

    fn launching(times: usize) -> MockLauncher {
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().times(times).returning(|_| Ok(()));
        launcher
    }

    struct FixedClassifier(&'static str, f32);

    impl IntentClassifier for FixedClassifier {
        fn classify(&self, _text: &str) -> Option<(String, f32)> {
            Some((self.0.to_string(), self.1))
        }
    }

    #[test]
    fn open_notepad_in_normal_mode() {
        let h = Harness::new(OperatingMode::Normal);
        let mut op = MockOperator::new();
        op.expect_confirm()
            .with(eq("About to execute: open app notepad. Proceed?"))
            .times(1)
            .returning(|_| true);
        let mut d = h.dispatcher(op, launching(1));

        assert_eq!(d.route("open_app", "open notepad"), "Opening notepad.");

        let current = d.context().current().unwrap();
        assert_eq!(current.kind, ActionKind::OpenApp);
        assert_eq!(current.target, "notepad");

        let effects = h.effect_records();
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].action, "open_app");
        assert_eq!(effects[0].status, AuditStatus::Ok);

        let pointer = AppStateStore::new(h.paths.app_state_file()).last_opened();
        assert_eq!(pointer, Some(LastOpened::new(TargetKind::App, "notepad")));
    }

    #[test]
    fn pro_mode_opens_without_prompting() {
        let h = Harness::new(OperatingMode::Pro);
        let mut launcher = MockLauncher::new();
        launcher
            .expect_open_url()
            .with(eq("https://github.com"))
            .times(1)
            .returning(|_| Ok(()));
        let mut d = h.dispatcher(MockOperator::new(), launcher);

        assert_eq!(d.route("browse", "github please"), "Opening github.");
        assert_eq!(d.context().current().unwrap().kind, ActionKind::OpenWebsite);
    }

    #[test]
    fn unknown_app_is_not_gated_or_audited() {
        let h = Harness::new(OperatingMode::Normal);
        let mut d = h.dispatcher(MockOperator::new(), MockLauncher::new());

        assert_eq!(d.open_app("open photoshop"), "Application not found.");
        assert_eq!(d.open_website("open myspace"), "Website not found.");
        assert!(h.records().is_empty());
    }

    #[test]
    fn denied_open_is_cancelled_without_launch() {
        let h = Harness::new(OperatingMode::Normal);
        let mut op = MockOperator::new();
        op.expect_confirm().times(1).returning(|_| false);
        let mut d = h.dispatcher(op, MockLauncher::new());

        assert_eq!(d.open_app("notepad"), "Cancelled.");
        assert!(d.context().current().is_none());
        assert!(h.effect_records().is_empty());
    }

    #[test]
    fn launch_failure_is_reported_and_audited() {
        let h = Harness::new(OperatingMode::Pro);
        let mut launcher = MockLauncher::new();
        launcher.expect_launch().returning(|_| {
            Err(ActionError::Launch(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such program",
            )))
        });
        let mut d = h.dispatcher(MockOperator::new(), launcher);

        assert_eq!(d.open_app("calculator"), "Failed to open calculator.");
        assert!(d.context().current().is_none());
        let effects = h.effect_records();
        assert_eq!(effects[0].status, AuditStatus::Error);
        assert!(effects[0].details["error"].as_str().unwrap().contains("no such program"));
    }

    #[test]
    fn close_last_uses_context_and_clears_it() {
        let h = Harness::new(OperatingMode::Pro);
        let mut launcher = launching(1);
        launcher
            .expect_terminate()
            .with(eq(Registry::builtin().app("notepad").unwrap().termination_handle.clone().unwrap()))
            .times(1)
            .returning(|_| Ok(()));
        let mut d = h.dispatcher(MockOperator::new(), launcher);

        assert_eq!(d.close_last(), "I don't know what to close.");
        d.open_app("notepad");
        assert_eq!(d.route("close", ""), "Closed notepad.");
        assert!(d.context().current().is_none());
        assert_eq!(d.close_last(), "I don't know what to close.");
    }

    #[test]
    fn close_reports_not_running() {
        let h = Harness::new(OperatingMode::Pro);
        let mut launcher = MockLauncher::new();
        launcher
            .expect_terminate()
            .returning(|_| Err(ActionError::NotRunning));
        let mut d = h.dispatcher(MockOperator::new(), launcher);

        assert_eq!(d.close_by_name("close calculator"), "calculator is not running.");
        let effects = h.effect_records();
        assert_eq!(effects[0].action, "close_app");
        assert_eq!(effects[0].status, AuditStatus::NotRunning);
    }

    #[test]
    fn close_website_context_is_not_closable() {
        let h = Harness::new(OperatingMode::Pro);
        let mut launcher = MockLauncher::new();
        launcher.expect_open_url().returning(|_| Ok(()));
        let mut d = h.dispatcher(MockOperator::new(), launcher);

        d.open_website("youtube");
        assert_eq!(d.close_last(), "I don't know what to close.");
        assert_eq!(d.close_by_name("close winamp"), "I couldn't find the application to close.");
    }

    #[test]
    fn app_without_handle_cannot_be_closed() {
        let h = Harness::new(OperatingMode::Pro);
        let mut d = h.dispatcher(MockOperator::new(), MockLauncher::new());
        let mut registry = Registry::builtin();
        registry.insert_app(AppDescriptor {
            name: "paint".to_string(),
            launch_command: "paint".to_string(),
            termination_handle: None,
        });
        d.registry = registry;

        assert_eq!(d.close_by_name("close paint"), "Cannot determine how to close this app.");
        assert!(h.records().is_empty());
    }

    #[test]
    fn reopen_prefers_context_then_durable_pointer() {
        let h = Harness::new(OperatingMode::Pro);
        let mut launcher = MockLauncher::new();
        launcher.expect_open_url().times(2).returning(|_| Ok(()));
        launcher.expect_launch().times(1).returning(|_| Ok(()));

        {
            let mut d = h.dispatcher(MockOperator::new(), launcher);
            assert_eq!(d.reopen_last(), "I don't know what to open again.");
            d.open_website("wikipedia");
            assert_eq!(d.reopen_last(), "Opening wikipedia again.");
            d.open_app("vscode");
        }

        // Fresh process: empty context, pointer survives.
        let mut launcher = MockLauncher::new();
        launcher
            .expect_launch()
            .with(eq(Registry::builtin().app("vscode").unwrap().launch_command.clone()))
            .times(1)
            .returning(|_| Ok(()));
        let mut d = h.dispatcher(MockOperator::new(), launcher);
        assert!(d.context().current().is_none());
        assert_eq!(d.route("reopen", ""), "Opening vscode again.");
        assert_eq!(d.context().current().unwrap().target, "vscode");

        let again: Vec<_> = h
            .effect_records()
            .into_iter()
            .filter(|r| r.action == "open_again")
            .collect();
        assert_eq!(again.len(), 2);
        assert_eq!(again[1].details["type"], "app");
    }

    #[test]
    fn reopen_prompt_names_reopen() {
        let h = Harness::new(OperatingMode::Normal);
        AppStateStore::new(h.paths.app_state_file())
            .set_last_opened(&LastOpened::new(TargetKind::App, "calc"))
            .unwrap();
        let mut op = MockOperator::new();
        op.expect_confirm()
            .with(eq("About to execute: reopen app calc. Proceed?"))
            .times(1)
            .returning(|_| false);
        let mut d = h.dispatcher(op, MockLauncher::new());

        assert_eq!(d.reopen_last(), "Cancelled.");
    }

    #[test]
    fn stale_pointer_cannot_be_reopened() {
        let h = Harness::new(OperatingMode::Pro);
        AppStateStore::new(h.paths.app_state_file())
            .set_last_opened(&LastOpened::new(TargetKind::Website, "geocities"))
            .unwrap();
        let mut d = h.dispatcher(MockOperator::new(), MockLauncher::new());
        assert_eq!(d.reopen_last(), "I can't reopen that website.");
    }

    #[test]
    fn exit_gate_controls_shutdown() {
        let h = Harness::new(OperatingMode::Normal);
        let mut op = MockOperator::new();
        op.expect_confirm().times(1).returning(|_| false);
        let mut d = h.dispatcher(op, MockLauncher::new());
        assert_eq!(d.exit(), "Exit cancelled.");
        assert!(!d.should_exit());

        let mut op = approving();
        op.expect_read_secret()
            .times(1)
            .returning(|_| Some("1234".to_string()));
        let mut d = h.dispatcher(op, MockLauncher::new());
        assert_eq!(d.route("exit", ""), "Shutting down.");
        assert!(d.should_exit());
        assert!(h.effect_records().iter().any(|r| r.action == "exit"));
    }

    #[test]
    fn mode_intents() {
        let h = Harness::new(OperatingMode::Normal);
        let mut op = approving();
        op.expect_read_secret()
            .times(1)
            .returning(|_| Some("1234".to_string()));
        let mut d = h.dispatcher(op, MockLauncher::new());

        assert_eq!(d.route("mode", ""), "Current mode: normal.");
        assert_eq!(d.route("set_mode", "switch to pro mode"), "Mode set to pro.");
        assert_eq!(d.route("mode", ""), "Current mode: pro.");
        // Session still active: no second PIN prompt.
        assert_eq!(d.route("set_mode", "normal"), "Mode set to normal.");
    }

    #[test]
    fn greeting_time_and_unknown() {
        let h = Harness::new(OperatingMode::Normal);
        let mut d = h.dispatcher(MockOperator::new(), MockLauncher::new());

        assert_eq!(d.route("greeting", ""), "Hello! How can I help you?");
        assert_eq!(d.route("hi", ""), "Hello! How can I help you?");
        assert!(d.route("time", "").starts_with("Current time is "));
        assert_eq!(d.route("dance", "now"), NOT_UNDERSTOOD);
        assert!(h.records().is_empty());
    }

    #[test]
    fn classifier_threshold() {
        let h = Harness::new(OperatingMode::Normal);
        let mut d = h
            .dispatcher(MockOperator::new(), MockLauncher::new())
            .with_min_confidence(0.6);

        assert_eq!(
            d.handle_text(&FixedClassifier("greeting", 0.9), "hey there"),
            "Hello! How can I help you?"
        );
        assert_eq!(
            d.handle_text(&FixedClassifier("greeting", 0.3), "hmm"),
            NOT_UNDERSTOOD
        );
    }

    #[test]
    fn text_splitting() {
        assert_eq!(split_pair("a.txt to b.txt"), Some(("a.txt", "b.txt")));
        assert_eq!(split_pair("a.txt b.txt"), Some(("a.txt", "b.txt")));
        assert_eq!(split_pair("a.txt"), None);
        assert_eq!(split_path_and_rest("notes.txt hello world"), ("notes.txt", "hello world"));
        assert_eq!(split_path_and_rest("notes.txt"), ("notes.txt", ""));
    }

    #[test]
    fn quoted_paths_keep_their_spaces() {
        assert_eq!(
            split_path_and_rest("\"my notes.txt\" buy milk"),
            ("my notes.txt", "buy milk")
        );
        assert_eq!(split_path_and_rest("'a b'"), ("a b", ""));
        assert_eq!(
            split_pair("\"old file.txt\" to \"new file.txt\""),
            Some(("old file.txt", "new file.txt"))
        );
        assert_eq!(
            split_pair("'old file.txt' new.txt"),
            Some(("old file.txt", "new.txt"))
        );
        assert_eq!(
            split_pair("my report.txt to archive/my report.txt"),
            Some(("my report.txt", "archive/my report.txt"))
        );
        assert_eq!(split_pair("\"only one\""), None);
    }

    #[test]
    fn destructive_text_needs_strict_confirmation() {
        let h = Harness::new(OperatingMode::Pro);
        let mut op = MockOperator::new();
        op.expect_confirm_strict()
            .with(
                eq("This looks destructive (notepad and wipe the disk). Are you absolutely sure?"),
                eq("CONFIRM"),
            )
            .times(1)
            .returning(|_, _| false);
        let mut d = h.dispatcher(op, MockLauncher::new());

        assert_eq!(d.route("open_app", "notepad and wipe the disk"), "Cancelled.");
        assert!(d.context().current().is_none());
        let log = h.records();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].reason(), Some("destructive_not_confirmed"));
    }

    #[test]
    fn path_intents_skip_the_text_check() {
        let h = Harness::new(OperatingMode::Pro);
        let mut op = MockOperator::new();
        op.expect_notify().returning(|_| ());
        op.expect_confirm_strict().never();
        let mut d = h.dispatcher(op, MockLauncher::new());

        // Outside the sandbox, so the file gate denies without prompting.
        assert_eq!(d.route("list_dir", "/tmp/format-notes"), "Operation cancelled.");
    }

    #[test]
    fn lock_forces_a_new_pin_prompt() {
        let h = Harness::new(OperatingMode::Normal);
        let mut op = approving();
        op.expect_read_secret()
            .times(2)
            .returning(|_| Some("1234".to_string()));
        let mut d = h.dispatcher(op, MockLauncher::new());

        assert_eq!(d.route("set_mode", "pro"), "Mode set to pro.");
        assert_eq!(d.lock(), "Session locked.");
        assert_eq!(d.route("set_mode", "normal"), "Mode set to normal.");
    }
}

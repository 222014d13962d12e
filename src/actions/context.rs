//! Two-slot action history used to resolve "close it" and "open that again".

use crate::state::TargetKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    OpenApp,
    OpenWebsite,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::OpenApp => "open_app",
            ActionKind::OpenWebsite => "open_website",
        }
    }

    pub fn opening(kind: TargetKind) -> Self {
        match kind {
            TargetKind::App => ActionKind::OpenApp,
            TargetKind::Website => ActionKind::OpenWebsite,
        }
    }

    pub fn target_kind(&self) -> TargetKind {
        match self {
            ActionKind::OpenApp => TargetKind::App,
            ActionKind::OpenWebsite => TargetKind::Website,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub kind: ActionKind,
    pub target: String,
}

/// `current` is the last action, `previous` the one before it. Starts
/// empty every process run.
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    current: Option<ContextEntry>,
    previous: Option<ContextEntry>,
}

impl ActionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new action. The old `current` moves to `previous`.
    pub fn set(&mut self, kind: ActionKind, target: impl Into<String>) {
        let entry = ContextEntry {
            kind,
            target: target.into(),
        };
        self.previous = self.current.replace(entry);
    }

    pub fn current(&self) -> Option<&ContextEntry> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&ContextEntry> {
        self.previous.as_ref()
    }

    /// Forget `current` only; `previous` is kept.
    pub fn clear_current(&mut self) {
        self.current = None;
    }
}

//! Persisted application state: operating mode and the durable
//! "last opened" pointer.
//!
//! Stored at `<state_dir>/state.json` as a single JSON object:
//!
//! ```json
//! { "mode": "normal", "last_open_app": "app:notepad" }
//! ```
//!
//! Unknown keys are preserved across rewrites.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// How much friction the gateway applies to routine actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    #[default]
    Normal,
    Pro,
}

impl OperatingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingMode::Normal => "normal",
            OperatingMode::Pro => "pro",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(OperatingMode::Normal),
            "pro" => Ok(OperatingMode::Pro),
            other => anyhow::bail!("Unknown mode: {} (expected normal or pro)", other),
        }
    }
}

// Anything unrecognised in the state file reads back as normal.
impl<'de> Deserialize<'de> for OperatingMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| s.parse().ok()).unwrap_or_default())
    }
}

/// Kind of target the dispatcher can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    App,
    Website,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::App => "app",
            TargetKind::Website => "website",
        }
    }
}

/// Durable `kind:name` pointer to the most recently opened target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastOpened {
    pub kind: TargetKind,
    pub name: String,
}

impl LastOpened {
    pub fn new(kind: TargetKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for LastOpened {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.name)
    }
}

impl FromStr for LastOpened {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, name) = s
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("Malformed last-opened pointer: {}", s))?;
        let kind = match kind {
            "app" => TargetKind::App,
            "website" => TargetKind::Website,
            other => anyhow::bail!("Unknown target kind: {}", other),
        };
        if name.is_empty() {
            anyhow::bail!("Last-opened pointer has no name");
        }
        Ok(Self::new(kind, name))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub mode: OperatingMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_open_app: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// File-backed application state.
#[derive(Debug, Clone)]
pub struct AppStateStore {
    path: PathBuf,
}

impl AppStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current state; defaults when the file is missing or unreadable.
    pub fn load(&self) -> AppState {
        if !self.path.exists() {
            return AppState::default();
        }
        let parsed = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))
            .and_then(|json| serde_json::from_str(&json).context("Failed to parse app state"));
        match parsed {
            Ok(state) => state,
            Err(e) => {
                warn!("App state unreadable, using defaults: {:#}", e);
                AppState::default()
            }
        }
    }

    pub fn save(&self, state: &AppState) -> Result<()> {
        let json = serde_json::to_string_pretty(state).context("Failed to serialize app state")?;
        crate::paths::atomic_write(&self.path, json.as_bytes())
    }

    pub fn mode(&self) -> OperatingMode {
        self.load().mode
    }

    pub fn persist_mode(&self, mode: OperatingMode) -> Result<()> {
        let mut state = self.load();
        state.mode = mode;
        self.save(&state)?;
        debug!("Persisted mode {}", mode);
        Ok(())
    }

    pub fn last_opened(&self) -> Option<LastOpened> {
        let raw = self.load().last_open_app?;
        match raw.parse() {
            Ok(pointer) => Some(pointer),
            Err(e) => {
                warn!("Ignoring last-opened pointer: {:#}", e);
                None
            }
        }
    }

    pub fn set_last_opened(&self, pointer: &LastOpened) -> Result<()> {
        let mut state = self.load();
        state.last_open_app = Some(pointer.to_string());
        self.save(&state)
    }
}

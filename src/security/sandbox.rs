//! Filesystem sandbox: the allow-list of directories file operations may
//! touch, plus the protected roots that are never permitted.
//!
//! Persisted at `<data_dir>/security.json`:
//!
//! ```json
//! { "allowed_paths": ["/home/me/Documents"], "protected_paths": ["/", "C:\\", "C:/"] }
//! ```
//!
//! A path is permitted iff it equals or descends from an allowed entry and
//! is not equal to any protected entry. Protected equality wins.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Roots that can never be operated on, whatever the allow-list says.
pub const PROTECTED_ROOTS: &[&str] = &["/", "C:\\", "C:/"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxPolicy {
    #[serde(default)]
    pub allowed_paths: BTreeSet<PathBuf>,
    #[serde(default)]
    pub protected_paths: BTreeSet<String>,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self {
            allowed_paths: BTreeSet::new(),
            protected_paths: PROTECTED_ROOTS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl SandboxPolicy {
    pub fn is_protected(&self, path: &Path) -> bool {
        self.protected_paths
            .iter()
            .filter_map(|p| normalize_path(p))
            .any(|protected| protected == path)
    }

    pub fn is_within_allowed(&self, path: &Path) -> bool {
        self.allowed_paths.iter().any(|allowed| {
            let allowed = allowed.to_str().and_then(normalize_path).unwrap_or_else(|| allowed.clone());
            path.starts_with(&allowed)
        })
    }
}

/// File-backed sandbox policy.
#[derive(Debug, Clone)]
pub struct SandboxStore {
    path: PathBuf,
    policy: SandboxPolicy,
}

impl SandboxStore {
    /// Load the policy at `path`. A missing or unreadable file yields the
    /// default policy, which allows nothing.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut policy = match Self::read(&path) {
            Ok(Some(policy)) => policy,
            Ok(None) => SandboxPolicy::default(),
            Err(e) => {
                warn!("Sandbox policy unreadable, denying all paths: {:#}", e);
                SandboxPolicy::default()
            }
        };

        // Protected roots are a fixed seed set; a hand-edited file cannot drop them.
        for root in PROTECTED_ROOTS {
            policy.protected_paths.insert(root.to_string());
        }

        Self { path, policy }
    }

    fn read(path: &Path) -> Result<Option<SandboxPolicy>> {
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let policy = serde_json::from_str(&json).context("Failed to parse sandbox policy")?;
        Ok(Some(policy))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    pub fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.policy)
            .context("Failed to serialize sandbox policy")?;
        crate::paths::atomic_write(&self.path, json.as_bytes())
    }

    /// Add `path` to the allow-list. Returns `Ok(false)` for an empty path
    /// and `Ok(true)` once the normalized path is present (new or not).
    pub fn add_allowed_directory(&mut self, path: &str) -> Result<bool> {
        let Some(normalized) = normalize_path(path) else {
            debug!("Ignoring empty sandbox path");
            return Ok(false);
        };

        if self.policy.allowed_paths.insert(normalized.clone()) {
            self.persist()?;
            info!("Sandbox now allows {}", normalized.display());
        } else {
            debug!("Sandbox already allows {}", normalized.display());
        }
        Ok(true)
    }

    /// Whether file operations may target `path`.
    pub fn is_path_allowed(&self, path: &str) -> bool {
        let Some(normalized) = normalize_path(path) else {
            return false;
        };

        if self.policy.is_protected(&normalized) {
            debug!("Sandbox: {} is a protected root", normalized.display());
            return false;
        }

        self.policy.is_within_allowed(&normalized)
    }
}

/// Expand `~`, make absolute, resolve `.`/`..` lexically, then resolve
/// symlinks for whatever prefix of the path exists. `None` for blank input.
pub fn normalize_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let expanded = shellexpand::tilde(trimmed);
    let absolute = std::path::absolute(Path::new(expanded.as_ref())).ok()?;
    Some(canonicalize_existing_prefix(&lexical_clean(&absolute)))
}

fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn canonicalize_existing_prefix(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut missing = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut out = canonical;
            for name in missing.iter().rev() {
                out.push(name);
            }
            return out;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> SandboxStore {
        SandboxStore::load(dir.join("security.json"))
    }

    fn as_str(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn default_policy_denies_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        assert!(!store.is_path_allowed(as_str(tmp.path())));
        assert!(!store.is_path_allowed("/"));
    }

    #[test]
    fn allowed_directory_covers_descendants() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = tmp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();

        let mut store = store_in(tmp.path());
        assert!(store.add_allowed_directory(as_str(&docs)).unwrap());

        assert!(store.is_path_allowed(as_str(&docs)));
        assert!(store.is_path_allowed(as_str(&docs.join("notes.txt"))));
        assert!(store.is_path_allowed(as_str(&docs.join("a/b/new.txt"))));
        assert!(!store.is_path_allowed(as_str(&tmp.path().join("docs-other"))));
        assert!(!store.is_path_allowed(as_str(tmp.path())));
    }

    #[test]
    fn parent_traversal_cannot_escape() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = tmp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();

        let mut store = store_in(tmp.path());
        store.add_allowed_directory(as_str(&docs)).unwrap();

        let escape = format!("{}/../secret.txt", docs.display());
        assert!(!store.is_path_allowed(&escape));
        let inside = format!("{}/sub/../file.txt", docs.display());
        assert!(store.is_path_allowed(&inside));
    }

    #[test]
    fn protected_root_wins_over_allow_list() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = store_in(tmp.path());
        store.add_allowed_directory("/").unwrap();

        assert!(!store.is_path_allowed("/"));
        assert!(store.is_path_allowed(as_str(tmp.path())));
    }

    #[test]
    fn drive_root_is_always_denied() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = store_in(tmp.path());
        store.add_allowed_directory("C:\\").unwrap();
        store.add_allowed_directory("/").unwrap();

        assert!(!store.is_path_allowed("C:\\"));
        assert!(!store.is_path_allowed("C:/"));
    }

    #[test]
    fn adding_twice_keeps_one_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = tmp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();

        let mut store = store_in(tmp.path());
        store.add_allowed_directory(as_str(&docs)).unwrap();
        store
            .add_allowed_directory(&format!("{}/./", docs.display()))
            .unwrap();

        assert_eq!(store.policy().allowed_paths.len(), 1);
    }

    #[test]
    fn empty_path_is_rejected_and_never_allowed() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = store_in(tmp.path());

        assert!(!store.add_allowed_directory("").unwrap());
        assert!(!store.add_allowed_directory("   ").unwrap());
        assert!(store.policy().allowed_paths.is_empty());
        assert!(!store.is_path_allowed(""));
        assert!(!store.path().exists());
    }

    #[test]
    fn allow_list_survives_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = tmp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();

        store_in(tmp.path())
            .add_allowed_directory(as_str(&docs))
            .unwrap();

        let reloaded = store_in(tmp.path());
        assert!(reloaded.is_path_allowed(as_str(&docs.join("x.txt"))));
    }

    #[test]
    fn protected_roots_reseeded_on_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("security.json");
        fs::write(&path, r#"{"allowed_paths": [], "protected_paths": []}"#).unwrap();

        let store = SandboxStore::load(&path);
        for root in PROTECTED_ROOTS {
            assert!(store.policy().protected_paths.contains(*root));
        }
    }

    #[test]
    fn corrupt_policy_falls_back_to_deny_all() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("security.json");
        fs::write(&path, "{ nope").unwrap();

        let store = SandboxStore::load(&path);
        assert!(store.policy().allowed_paths.is_empty());
        assert!(!store.is_path_allowed(as_str(tmp.path())));
    }

    #[test]
    fn normalize_handles_tilde_and_blank() {
        assert!(normalize_path("").is_none());
        assert!(normalize_path(" \t").is_none());

        let home = normalize_path("~").unwrap();
        assert!(home.is_absolute());
        assert_eq!(normalize_path("/"), Some(PathBuf::from("/")));
    }
}

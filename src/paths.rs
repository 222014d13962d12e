//! XDG Base Directory Specification compliant path resolution.
//!
//! Every directory is resolved through a three-level fallback:
//! 1. Jarvis-specific env var (JARVIS_CONFIG_DIR, etc.)
//! 2. XDG env var (XDG_CONFIG_HOME, etc.) via `etcetera`
//! 3. Platform default (~/.config, etc.)
//!
//! All paths are absolute. Relative paths from env vars are ignored per XDG spec.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Resolved directory paths for the entire application.
///
/// Created once at startup, threaded through Config.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Config directory: config.toml lives here
    pub config_dir: PathBuf,

    /// Data directory: credential record and sandbox policy
    pub data_dir: PathBuf,

    /// State directory: operating mode, last-opened pointer, audit log
    pub state_dir: PathBuf,
}

impl Paths {
    /// Resolve all paths using real environment variables.
    pub fn resolve() -> Result<Self> {
        Self::resolve_with_env(|key| std::env::var(key))
    }

    /// Resolve paths with a custom env var lookup (for testing).
    pub fn resolve_with_env<F>(env_fn: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        use etcetera::BaseStrategy;

        let strategy = etcetera::choose_base_strategy()
            .map_err(|e| anyhow::anyhow!("Failed to determine base directories: {}", e))?;

        let config_dir = env_or(&env_fn, "JARVIS_CONFIG_DIR", || {
            strategy.config_dir().join("jarvis")
        });

        let data_dir = env_or(&env_fn, "JARVIS_DATA_DIR", || {
            strategy.data_dir().join("jarvis")
        });

        let state_dir = env_or(&env_fn, "JARVIS_STATE_DIR", || {
            let base_state = strategy.state_dir().unwrap_or_else(|| strategy.data_dir());
            base_state.join("jarvis")
        });

        Ok(Self {
            config_dir,
            data_dir,
            state_dir,
        })
    }

    /// Build a layout rooted in a single directory. Used by tests and
    /// portable installs.
    pub fn under(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
            state_dir: root.join("state"),
        }
    }

    // ── Convenience accessors for specific files ──

    /// Config file: config_dir/config.toml
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Credential record: data_dir/auth.json
    pub fn credential_file(&self) -> PathBuf {
        self.data_dir.join("auth.json")
    }

    /// Sandbox policy: data_dir/security.json
    pub fn security_file(&self) -> PathBuf {
        self.data_dir.join("security.json")
    }

    /// Operating mode and last-opened pointer: state_dir/state.json
    pub fn app_state_file(&self) -> PathBuf {
        self.state_dir.join("state.json")
    }

    /// Audit log: state_dir/activity.jsonl
    pub fn audit_log(&self) -> PathBuf {
        self.state_dir.join("activity.jsonl")
    }

    /// Create all directories with appropriate permissions.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir, &self.state_dir] {
            create_dir_with_mode(dir)?;
        }
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::resolve().unwrap_or_else(|_| {
            let home = etcetera::home_dir().unwrap_or_else(|_| PathBuf::from("."));
            Self {
                config_dir: home.join(".config").join("jarvis"),
                data_dir: home.join(".local").join("share").join("jarvis"),
                state_dir: home.join(".local").join("state").join("jarvis"),
            }
        })
    }
}

/// Resolve an env var with fallback. Ignores empty and relative paths per XDG spec.
fn env_or<F>(env_fn: &F, var: &str, default: impl FnOnce() -> PathBuf) -> PathBuf
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    env_fn(var)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.is_absolute())
        .unwrap_or_else(default)
}

/// Create a directory with mode 0700 per XDG spec.
fn create_dir_with_mode(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// Replace `path` with `bytes` so that readers never observe a partial file.
///
/// Writes a sibling `.tmp` file, then renames it over the target.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Helper: build an env_fn from a HashMap
    fn make_env(
        map: HashMap<&str, &str>,
    ) -> impl Fn(&str) -> std::result::Result<String, std::env::VarError> {
        move |key: &str| {
            map.get(key)
                .map(|v| v.to_string())
                .ok_or(std::env::VarError::NotPresent)
        }
    }

    #[test]
    fn default_paths_are_xdg_compliant() {
        let paths = Paths::resolve_with_env(make_env(HashMap::new())).unwrap();

        assert!(paths.config_dir.ends_with("jarvis"));
        assert!(paths.data_dir.ends_with("jarvis"));
        assert!(paths.state_dir.ends_with("jarvis"));
    }

    #[test]
    fn jarvis_env_vars_override_xdg() {
        let mut env: HashMap<&str, &str> = HashMap::new();
        env.insert("JARVIS_CONFIG_DIR", "/custom/config");
        env.insert("JARVIS_DATA_DIR", "/custom/data");
        env.insert("JARVIS_STATE_DIR", "/custom/state");

        let paths = Paths::resolve_with_env(make_env(env)).unwrap();
        assert_eq!(paths.config_dir, PathBuf::from("/custom/config"));
        assert_eq!(paths.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(paths.state_dir, PathBuf::from("/custom/state"));
    }

    #[test]
    fn relative_and_empty_overrides_are_ignored() {
        let mut env: HashMap<&str, &str> = HashMap::new();
        env.insert("JARVIS_CONFIG_DIR", "relative/path");
        env.insert("JARVIS_DATA_DIR", "");

        let paths = Paths::resolve_with_env(make_env(env)).unwrap();
        assert!(paths.config_dir.is_absolute());
        assert_ne!(paths.config_dir, PathBuf::from("relative/path"));
        assert!(paths.data_dir.ends_with("jarvis"));
    }

    #[test]
    fn convenience_accessors() {
        let paths = Paths::under(Path::new("/srv/jarvis"));

        assert!(paths.config_file().ends_with("config/config.toml"));
        assert!(paths.credential_file().ends_with("data/auth.json"));
        assert!(paths.security_file().ends_with("data/security.json"));
        assert!(paths.app_state_file().ends_with("state/state.json"));
        assert!(paths.audit_log().ends_with("state/activity.jsonl"));
    }

    #[test]
    fn atomic_write_replaces_and_leaves_no_tmp() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("nested").join("doc.json");

        atomic_write(&target, b"{\"v\":1}").unwrap();
        atomic_write(&target, b"{\"v\":2}").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{\"v\":2}");
        assert!(!target.with_extension("tmp").exists());
    }
}

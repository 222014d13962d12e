use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::paths::Paths;

/// Lowest PBKDF2 iteration count accepted for new credential records.
pub const MIN_PBKDF2_ITERATIONS: u32 = 120_000;

/// Longest session a PIN entry can open: one day.
pub const MAX_SESSION_TTL_SECS: u64 = 86_400;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Resolved XDG-compliant paths (not serialized)
    #[serde(skip)]
    pub paths: Paths,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub intent: IntentConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Extra applications merged over the built-in registry
    #[serde(default)]
    pub apps: BTreeMap<String, AppEntry>,

    /// Extra websites merged over the built-in registry: name -> URL
    #[serde(default)]
    pub websites: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// How long a successful PIN entry is remembered (default: 900)
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// PIN attempts per authentication prompt (default: 3)
    #[serde(default = "default_max_auth_attempts")]
    pub max_auth_attempts: u32,

    /// PBKDF2-HMAC-SHA256 iterations for new PINs (floor: 120000)
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Token the operator must type to approve destructive file operations
    #[serde(default = "default_strict_confirm_token")]
    pub strict_confirm_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentConfig {
    /// Classifier results below this confidence are treated as "not understood"
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// A user-defined application entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppEntry {
    /// Shell command used to launch the application
    pub launch: String,

    /// Process image name used to terminate it (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
}

fn default_session_ttl() -> u64 {
    900
}
fn default_max_auth_attempts() -> u32 {
    3
}
fn default_pbkdf2_iterations() -> u32 {
    150_000
}
fn default_strict_confirm_token() -> String {
    "CONFIRM".to_string()
}
fn default_min_confidence() -> f32 {
    0.6
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl(),
            max_auth_attempts: default_max_auth_attempts(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            strict_confirm_token: default_strict_confirm_token(),
        }
    }
}

impl SecurityConfig {
    /// Session lifetime, capped at [`MAX_SESSION_TTL_SECS`].
    pub fn session_ttl(&self) -> chrono::Duration {
        let secs = self.session_ttl_secs.min(MAX_SESSION_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }

    /// Iteration count to use for new records, never below the floor.
    pub fn effective_iterations(&self) -> u32 {
        self.pbkdf2_iterations.max(MIN_PBKDF2_ITERATIONS)
    }
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Paths::resolve()?;
        paths.ensure_dirs()?;
        Self::load_from(paths)
    }

    /// Load the config file under `paths`, creating it from the template on
    /// first run.
    pub fn load_from(paths: Paths) -> Result<Self> {
        let path = paths.config_file();

        if !path.exists() {
            let config = Config {
                paths,
                ..Config::default()
            };
            config.save_with_template()?;
            return Ok(config);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.paths = paths;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        crate::paths::atomic_write(&self.paths.config_file(), content.as_bytes())
    }

    /// Save config with a helpful template (for first-time setup)
    pub fn save_with_template(&self) -> Result<()> {
        let path = self.paths.config_file();
        crate::paths::atomic_write(&path, DEFAULT_CONFIG_TEMPLATE.as_bytes())?;
        eprintln!("Created default config at {}", path.display());
        Ok(())
    }

    /// `[logging] level` from an existing config file. Never creates one.
    pub fn configured_log_level() -> Option<String> {
        let path = Paths::resolve().ok()?.config_file();
        let content = fs::read_to_string(path).ok()?;
        let config: Config = toml::from_str(&content).ok()?;
        Some(config.logging.level)
    }

    pub fn config_path() -> Result<PathBuf> {
        let paths = Paths::resolve()?;
        Ok(paths.config_file())
    }

    pub fn get_value(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["security", "session_ttl_secs"] => Ok(self.security.session_ttl_secs.to_string()),
            ["security", "max_auth_attempts"] => Ok(self.security.max_auth_attempts.to_string()),
            ["security", "pbkdf2_iterations"] => Ok(self.security.pbkdf2_iterations.to_string()),
            ["security", "strict_confirm_token"] => Ok(self.security.strict_confirm_token.clone()),
            ["intent", "min_confidence"] => Ok(self.intent.min_confidence.to_string()),
            ["logging", "level"] => Ok(self.logging.level.clone()),
            ["websites", name] => self
                .websites
                .get(&name.to_lowercase())
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Unknown website: {}", name)),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["security", "session_ttl_secs"] => {
                let secs: u64 = value.parse()?;
                if secs > MAX_SESSION_TTL_SECS {
                    anyhow::bail!(
                        "security.session_ttl_secs must be at most {}",
                        MAX_SESSION_TTL_SECS
                    );
                }
                self.security.session_ttl_secs = secs;
            }
            ["security", "max_auth_attempts"] => {
                let attempts: u32 = value.parse()?;
                if attempts == 0 {
                    anyhow::bail!("security.max_auth_attempts must be at least 1");
                }
                self.security.max_auth_attempts = attempts;
            }
            ["security", "pbkdf2_iterations"] => {
                let iterations: u32 = value.parse()?;
                if iterations < MIN_PBKDF2_ITERATIONS {
                    anyhow::bail!(
                        "security.pbkdf2_iterations must be at least {}",
                        MIN_PBKDF2_ITERATIONS
                    );
                }
                self.security.pbkdf2_iterations = iterations;
            }
            ["security", "strict_confirm_token"] => {
                if value.trim().is_empty() {
                    anyhow::bail!("security.strict_confirm_token cannot be empty");
                }
                self.security.strict_confirm_token = value.trim().to_string();
            }
            ["intent", "min_confidence"] => self.intent.min_confidence = value.parse()?,
            ["logging", "level"] => self.logging.level = value.to_string(),
            ["websites", name] => {
                self.websites.insert(name.to_lowercase(), value.to_string());
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }

        Ok(())
    }
}

/// Default config template with helpful comments (used for first-time setup)
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Jarvis Configuration
# Auto-created on first run. Edit as needed.

[security]
# Seconds a successful PIN entry is remembered for gated actions (max 86400)
session_ttl_secs = 900
# PIN attempts allowed per prompt
max_auth_attempts = 3
# PBKDF2-HMAC-SHA256 iterations for new PINs (minimum 120000)
pbkdf2_iterations = 150000
# Word the operator must type to approve destructive file operations
strict_confirm_token = "CONFIRM"

[intent]
# Classifier results below this confidence are not acted on
min_confidence = 0.6

[logging]
level = "info"

# Extra applications (merged over the built-in list)
# [apps.firefox]
# launch = "firefox"
# process = "firefox"

# Extra websites (merged over the built-in list)
# [websites]
# docs = "https://docs.rs"
"#;

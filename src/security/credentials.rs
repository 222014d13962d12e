//! PIN credential record: creation, persistence, and verification.
//!
//! The PIN itself is never stored or logged. Only a salted
//! PBKDF2-HMAC-SHA256 digest is persisted, as a single JSON document:
//!
//! ```json
//! { "salt": "<32 hex>", "hash": "<64 hex>", "iterations": 150000,
//!   "created_at": "2026-10-16T09:00:00Z" }
//! ```
//!
//! The record is replaced wholesale when the operator resets the PIN and is
//! never partially mutated.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use hmac::Hmac;
use rand::RngExt;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fs;
use std::path::{Path, PathBuf};
use subtle::ConstantTimeEq;
use thiserror::Error;

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Shortest and longest accepted PIN.
pub const PIN_MIN_DIGITS: usize = 4;
pub const PIN_MAX_DIGITS: usize = 8;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Invalid PIN format. Use 4-8 digits.")]
    Format,

    #[error("PINs do not match.")]
    Mismatch,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Persisted credential: salt, derived hash, and derivation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(with = "hex::serde")]
    pub salt: [u8; SALT_LEN],
    #[serde(with = "hex::serde")]
    pub hash: [u8; HASH_LEN],
    pub iterations: u32,
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Derive a new record for `secret` with a fresh random salt.
    pub fn derive(secret: &str, iterations: u32) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill(&mut salt);

        let hash = hash_secret(secret, &salt, iterations)?;
        Ok(Self {
            salt,
            hash,
            iterations,
            created_at: Utc::now(),
        })
    }

    /// Recompute the digest for `candidate` and compare in constant time.
    pub fn matches(&self, candidate: &str) -> bool {
        match hash_secret(candidate, &self.salt, self.iterations) {
            Ok(derived) => bool::from(derived[..].ct_eq(&self.hash[..])),
            Err(_) => false,
        }
    }
}

/// True if `candidate` is a 4-8 digit numeric string.
pub fn is_valid_pin(candidate: &str) -> bool {
    (PIN_MIN_DIGITS..=PIN_MAX_DIGITS).contains(&candidate.len())
        && candidate.chars().all(|c| c.is_ascii_digit())
}

fn hash_secret(secret: &str, salt: &[u8], iterations: u32) -> Result<[u8; HASH_LEN]> {
    if iterations == 0 {
        anyhow::bail!("Credential record has zero iterations");
    }
    let mut out = [0u8; HASH_LEN];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(secret.as_bytes(), salt, iterations, &mut out)
        .map_err(|e| anyhow::anyhow!("PBKDF2 derivation failed: {}", e))?;
    Ok(out)
}

/// File-backed store for the single credential record.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate, derive, and persist a new PIN, replacing any prior record.
    pub fn set_secret(
        &self,
        candidate: &str,
        confirmation: &str,
        iterations: u32,
    ) -> std::result::Result<(), SecretError> {
        if !is_valid_pin(candidate) {
            return Err(SecretError::Format);
        }
        if candidate != confirmation {
            return Err(SecretError::Mismatch);
        }

        let record = CredentialRecord::derive(candidate, iterations)?;
        self.save(&record)?;
        tracing::info!(
            "Stored new credential record ({} iterations)",
            record.iterations
        );
        Ok(())
    }

    pub fn has_secret(&self) -> bool {
        matches!(self.load(), Ok(Some(_)))
    }

    /// Check `candidate` against the stored record. False when no record
    /// exists or it cannot be read.
    pub fn verify(&self, candidate: &str) -> bool {
        match self.load() {
            Ok(Some(record)) => record.matches(candidate),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Credential record unreadable: {:#}", e);
                false
            }
        }
    }

    pub fn load(&self) -> Result<Option<CredentialRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let record = serde_json::from_str(&json).context("Failed to parse credential record")?;
        Ok(Some(record))
    }

    /// Replace the stored record.
    pub fn save(&self, record: &CredentialRecord) -> Result<()> {
        let json =
            serde_json::to_string_pretty(record).context("Failed to serialize credential record")?;
        crate::paths::atomic_write(&self.path, json.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .context("Failed to set credential record permissions")?;
        }

        Ok(())
    }
}

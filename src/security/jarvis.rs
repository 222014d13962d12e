//! # Jarvis Security Module
//!
//! Every side effect the assistant can cause passes through here first.
//! This file is the **front door** for security review: all types,
//! constants, and functions the rest of the crate may use are re-exported
//! below.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                  jarvis.rs (you are here)                        │
//! │                  Public API facade & documentation               │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  gateway.rs — mode × risk × destructiveness × sandbox × PIN      │
//! ├───────────────┬───────────────┬───────────────┬──────────────────┤
//! │ session.rs    │ sandbox.rs    │ audit.rs      │ destructive.rs   │
//! │ PIN sessions, │ Allow-list +  │ Append-only   │ Keyword scan for │
//! │ attempt       │ protected     │ JSONL log     │ irreversible ops │
//! │ budget        │ roots         │               │                  │
//! ├───────────────┴───────────────┴───────────────┴──────────────────┤
//! │  credentials.rs — salted PBKDF2-HMAC-SHA256 PIN record           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Model
//!
//! 1. **Deny by default**: An empty allow-list permits no file operation.
//!    Protected roots (`/`, `C:\`) are refused even when an allowed
//!    directory contains them.
//!
//! 2. **Friction follows mode**: `normal` confirms every system action;
//!    `pro` auto-allows low-risk ones. Medium and high risk always need a
//!    confirmation and a PIN.
//!
//! 3. **Destructive overrides mode**: A destructive file operation needs
//!    the typed confirmation token and a PIN in every mode.
//!
//! 4. **Secrets stay secret**: Only the salted hash is persisted.
//!    Verification uses a constant-time comparison. The PIN is never
//!    logged or audited.
//!
//! 5. **Opaque denials**: Callers get a boolean. The reason for a denial
//!    is written to the audit log only.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jarvis::security::{Risk, VerificationGateway};
//! use jarvis::operator::ConsoleOperator;
//!
//! let mut gateway = VerificationGateway::from_config(&config);
//! let mut operator = ConsoleOperator::new();
//!
//! if gateway.verify_system_action(&mut operator, "open app notepad", Risk::Low) {
//!     // launch
//! }
//! ```
//!
//! ## File Hierarchy
//!
//! ```text
//! ~/.local/share/jarvis/        # Data directory
//! ├── auth.json                 # Credential record (0600)
//! └── security.json             # Sandbox policy
//! ~/.local/state/jarvis/        # State directory
//! ├── state.json                # Operating mode + last opened
//! └── activity.jsonl            # Append-only audit log
//! ```
//!
//! ## Threat Model
//!
//! | Threat | Defense Layer |
//! |--------|--------------|
//! | Misheard "delete" wipes a folder | Strict typed confirmation + PIN |
//! | Operation on a drive root | Protected roots, checked before the allow-list |
//! | `..` escape from an allowed directory | Lexical + canonical normalization |
//! | Bystander at the keyboard | PIN with attempt budget and session TTL |
//! | Credential file read | Salted PBKDF2, ≥120 000 iterations |
//! | Quiet mode change to `pro` | Mode change always requires a PIN |
//! | Disputed action | Append-only audit trail with reasons |

// ── Gateway ─────────────────────────────────────────────────────────

pub use super::gateway::{Risk, VerificationGateway};

// ── Credentials & Sessions ──────────────────────────────────────────

pub use super::credentials::{
    CredentialRecord, CredentialStore, PIN_MAX_DIGITS, PIN_MIN_DIGITS, SecretError, is_valid_pin,
};
pub use super::session::{
    Authenticator, Clock, DEFAULT_MAX_ATTEMPTS, DEFAULT_SESSION_TTL_SECS, Session, SystemClock,
};

// ── Sandbox ─────────────────────────────────────────────────────────

pub use super::sandbox::{PROTECTED_ROOTS, SandboxPolicy, SandboxStore, normalize_path};

// ── Destructive Detection ───────────────────────────────────────────

pub use super::destructive::{
    DESTRUCTIVE_COMMANDS, DESTRUCTIVE_KEYWORDS, destructive_markers, is_destructive,
};

// ── Audit Log ───────────────────────────────────────────────────────

pub use super::audit::{AuditLog, AuditRecord, AuditStatus, read_audit_log};

//! Credential sessions and the `require_auth` entry point.
//!
//! A successful PIN entry opens a [`Session`] that lets every gated call
//! skip the PIN prompt until `valid_until` passes. Sessions live only in
//! memory and die with the process.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::credentials::CredentialStore;
use crate::operator::Operator;

/// Default session lifetime in seconds.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 900;

/// Default number of PIN attempts per prompt.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time-bounded grant created by a successful PIN entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub valid_until: DateTime<Utc>,
}

impl Session {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.valid_until
    }
}

/// Owns the credential store and the current session.
pub struct Authenticator {
    credentials: CredentialStore,
    clock: Arc<dyn Clock>,
    session: Option<Session>,
    max_attempts: u32,
}

impl Authenticator {
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            credentials,
            clock: Arc::new(SystemClock),
            session: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn session(&self) -> Option<Session> {
        self.session
    }

    pub fn has_active_session(&self) -> bool {
        self.session
            .is_some_and(|s| s.is_active_at(self.clock.now()))
    }

    /// Drop the current session so the next gated call prompts again.
    pub fn end_session(&mut self) {
        self.session = None;
    }

    /// Allow immediately if a session is active; otherwise prompt for the
    /// PIN up to `max_attempts` times and open a session of length `ttl`
    /// on the first correct entry.
    pub fn require_auth(&mut self, operator: &mut dyn Operator, reason: &str, ttl: Duration) -> bool {
        let now = self.clock.now();
        if let Some(session) = self.session {
            if session.is_active_at(now) {
                debug!("Reusing session valid until {}", session.valid_until);
                return true;
            }
            debug!("Session expired at {}", session.valid_until);
            self.session = None;
        }

        if !self.credentials.has_secret() {
            warn!("Authentication requested but no PIN is configured");
            operator.notify("No PIN configured. Run `jarvis setup` to create one.");
            return false;
        }

        operator.notify(format!("Authentication required. {}", reason).trim());

        for attempt in 1..=self.max_attempts {
            let Some(candidate) = operator.read_secret("Enter PIN: ") else {
                debug!("PIN entry cancelled");
                break;
            };

            if self.credentials.verify(&candidate) {
                let valid_until = self
                    .clock
                    .now()
                    .checked_add_signed(ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                self.session = Some(Session { valid_until });
                info!("Authentication succeeded; session valid until {}", valid_until);
                operator.notify("Authentication successful.");
                return true;
            }

            warn!("Invalid PIN (attempt {}/{})", attempt, self.max_attempts);
            operator.notify("Invalid PIN.");
        }

        operator.notify("Authentication failed.");
        false
    }
}

//! Jarvis - a local voice/text assistant with a trust-gated action gateway
//!
//! This crate provides:
//! - Verification gateway combining operating mode, risk, sandbox, and PIN sessions
//! - PBKDF2-hashed PIN credentials with time-bounded sessions
//! - Filesystem sandbox with protected roots
//! - Append-only JSONL audit log
//! - Action dispatcher for apps, websites, and file operations with a
//!   two-slot action context

pub mod actions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod operator;
pub mod paths;
pub mod security;
pub mod state;

pub use config::Config;

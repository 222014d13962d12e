//! Centralized security module for Jarvis.
//!
//! See [`jarvis`] for the module overview, architecture diagram,
//! and public API documentation.

mod audit;
mod credentials;
mod destructive;
mod gateway;
mod jarvis;
mod sandbox;
mod session;

// The jarvis.rs facade controls the entire public API surface.
pub use self::jarvis::*;

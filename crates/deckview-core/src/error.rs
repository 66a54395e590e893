#![forbid(unsafe_code)]

//! Fatal startup errors.
//!
//! A missing scroll target is never an error; see
//! [`ScrollOutcome`](crate::ScrollOutcome). Everything here aborts the boot
//! and leaves the page without a UI.

use crate::bootstrap::BootPhase;

#[derive(Debug)]
pub enum BootError {
    /// The configuration failed validation.
    InvalidConfig(Vec<String>),
    /// No element matched the mount selector.
    MountPointMissing { selector: String },
    /// The initial data payload is not valid JSON.
    InvalidFlags(serde_json::Error),
    /// A flat payload must be a JSON array of cards.
    FlatFlagsNotArray,
    /// Deck-structured flags need a base URL.
    MissingBaseUrl,
    /// The UI application factory failed.
    AppInit(String),
    /// `run` was called on an orchestrator that already left `Uninitialized`.
    AlreadyStarted(BootPhase),
}

impl std::fmt::Display for BootError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(errors) => {
                write!(f, "invalid boot config: {}", errors.join("; "))
            }
            Self::MountPointMissing { selector } => {
                write!(f, "mount point not found: {selector}")
            }
            Self::InvalidFlags(e) => write!(f, "initial data is not valid JSON: {e}"),
            Self::FlatFlagsNotArray => write!(f, "flat initial data must be a JSON array"),
            Self::MissingBaseUrl => {
                write!(f, "deck-structured initial data requires a base URL")
            }
            Self::AppInit(msg) => write!(f, "UI application failed to start: {msg}"),
            Self::AlreadyStarted(phase) => {
                write!(f, "bootstrap already ran (phase {})", phase.as_str())
            }
        }
    }
}

impl std::error::Error for BootError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidFlags(e) => Some(e),
            _ => None,
        }
    }
}

//! Error types for the navigation session core

use serde::{Deserialize, Serialize};

/// Audio session operations the core may attempt around a reroute cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioAction {
    /// Mix the session's audio category with other audio (ambient)
    MixAmbient,
}

impl std::fmt::Display for AudioAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioAction::MixAmbient => write!(f, "mix ambient"),
        }
    }
}

/// Errors raised by the navigation session core
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("unable to control audio ({action}): {source}")]
    AudioControl {
        action: AudioAction,
        #[source]
        source: anyhow::Error,
    },

    #[error("required capability not declared: {0}")]
    MissingCapability(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("navigation session is no longer running")]
    SessionClosed,

    #[error("session input queue is full")]
    QueueFull,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by the route tracker when computing a new route.
///
/// The core never interprets the reason, it only relays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("reroute failed: {reason}")]
pub struct ReroutingError {
    pub reason: String,
}

impl ReroutingError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NavError>;

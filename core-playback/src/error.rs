//! # Playback Error Types
//!
//! Errors returned by session commands, the engine seam and the progress
//! reporter.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The playback engine rejected or failed a command.
    #[error("Playback engine error: {0}")]
    Engine(String),

    /// Attempted operation when no track is loaded.
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Host bridge failure (HTTP transport, status codes).
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Invalid playback configuration: {0}")]
    InvalidConfig(String),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// The part of the error shown after a user-facing prefix such as
    /// `Error playing {title}: `.
    ///
    /// Engine failures contribute the engine's own message.
    pub fn reason(&self) -> String {
        match self {
            PlaybackError::Engine(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

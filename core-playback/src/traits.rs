//! # Playback Engine Seam
//!
//! The audio pipeline (fetching, decoding, output, lock-screen controls) is
//! owned by the host's playback engine. The core drives it through
//! [`PlaybackEngine`] and learns what happened through [`EngineEvent`]s the
//! host forwards over an `mpsc` channel.
//!
//! ## Threading Model
//!
//! Engine commands are awaited from tokio tasks, so implementations must be
//! `Send + Sync`. Notifications may be produced on any thread; the host only
//! needs an `UnboundedSender<EngineEvent>`.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use core_playback::{EngineEvent, EngineState, PlaybackEngine};
//!
//! async fn start(engine: &dyn PlaybackEngine, tracks: Vec<EngineTrack>) -> Result<()> {
//!     engine.reset().await?;
//!     engine.load(tracks).await?;
//!     engine.play().await
//! }
//!
//! // Host side, from the engine's state callback:
//! events.send(EngineEvent::StateChanged(EngineState::Playing))?;
//! ```

use crate::error::Result;
use async_trait::async_trait;
use core_library::Track;
use serde::{Deserialize, Serialize};

// ============================================================================
// Engine commands
// ============================================================================

/// Control surface of the host playback engine.
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Stops playback and empties the engine queue.
    async fn reset(&self) -> Result<()>;

    /// Appends tracks to the engine queue.
    async fn load(&self, tracks: Vec<EngineTrack>) -> Result<()>;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    /// Seeks within the current track.
    async fn seek(&self, position_seconds: f64) -> Result<()>;

    /// Jumps to a zero-based index in the engine queue.
    async fn skip_to(&self, index: usize) -> Result<()>;

    /// Releases engine resources. Called once when the core shuts down.
    async fn release(&self) -> Result<()>;
}

/// Track description handed to the engine.
///
/// Carries what a platform player needs for streaming and for its now-playing
/// metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineTrack {
    pub id: String,
    pub url: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork_url: String,
    /// Seconds, 0 when unknown
    pub duration_seconds: u64,
}

impl From<&Track> for EngineTrack {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id.clone(),
            url: track.stream_url.clone(),
            title: track.title.clone(),
            artist: track.artist.name.clone(),
            album: track.album.title.clone(),
            artwork_url: track.artwork_url.clone(),
            duration_seconds: track.duration_seconds,
        }
    }
}

// ============================================================================
// Engine notifications
// ============================================================================

/// Player state reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineState {
    Buffering,
    Connecting,
    Ready,
    Playing,
    Paused,
    Stopped,
}

/// Notifications from the engine to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EngineEvent {
    StateChanged(EngineState),
    PositionUpdated {
        position_seconds: f64,
        duration_seconds: f64,
    },
    /// The engine moved to another queue entry on its own or after `skip_to`.
    TrackChanged { track_id: String },
    PlaybackFailed { message: String },
    /// The last queue entry finished.
    QueueEnded,
}

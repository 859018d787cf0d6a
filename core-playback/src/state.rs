//! Session state and the snapshots published to presenters.

use core_library::Track;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse playback status shown by presenters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Error,
}

impl PlaybackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "Idle",
            PlaybackStatus::Loading => "Loading",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
            PlaybackStatus::Error => "Error",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable session state, owned by [`PlaybackSession`](crate::PlaybackSession).
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub current_track: Option<Track>,
    pub queue: Vec<Track>,
    pub status: PlaybackStatus,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub last_error: Option<String>,
    pub is_scrubbing: bool,
    /// Identifies the most recent track-changing command.
    pub generation: u64,
}

impl SessionState {
    /// Index of the current track in the queue, matched by id.
    pub fn current_index(&self) -> Option<usize> {
        let current = self.current_track.as_ref()?;
        self.queue.iter().position(|track| track.same_item(current))
    }

    pub fn current_track_id(&self) -> Option<String> {
        self.current_track.as_ref().map(|track| track.id.clone())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_track: self.current_track.clone(),
            queue: self.queue.clone(),
            status: self.status,
            position_seconds: self.position_seconds,
            duration_seconds: self.duration_seconds,
            last_error: self.last_error.clone(),
            is_scrubbing: self.is_scrubbing,
        }
    }

    /// Starts a new track-changing command and returns its generation.
    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Makes `track` current with a fresh position and the track's duration.
    pub(crate) fn load_track(&mut self, track: Track) {
        self.position_seconds = 0.0;
        self.duration_seconds = track.duration_seconds as f64;
        self.current_track = Some(track);
        self.status = PlaybackStatus::Loading;
        self.last_error = None;
    }
}

/// Read-only copy of the session state for presenters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub current_track: Option<Track>,
    pub queue: Vec<Track>,
    pub status: PlaybackStatus,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub last_error: Option<String>,
    pub is_scrubbing: bool,
}

impl SessionSnapshot {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn is_loading(&self) -> bool {
        self.status == PlaybackStatus::Loading
    }

    pub fn current_track_id(&self) -> Option<&str> {
        self.current_track.as_ref().map(|track| track.id.as_str())
    }
}

//! # Playback Configuration
//!
//! Session behavior that hosts may want to tune.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the session does when the engine reports the end of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndOfQueuePolicy {
    /// Stay on the last track, paused at its end.
    #[default]
    Hold,
    /// Start again from the first queue entry.
    RepeatAll,
    /// Reset the session to idle with an empty queue.
    Clear,
}

/// Playback session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Default: [`EndOfQueuePolicy::Hold`].
    #[serde(default)]
    pub end_of_queue: EndOfQueuePolicy,

    /// Minimum position advance between two periodic progress reports.
    ///
    /// Track changes and pause toggles are reported regardless.
    ///
    /// Default: 10 seconds.
    #[serde(default = "default_progress_report_interval")]
    pub progress_report_interval: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            end_of_queue: EndOfQueuePolicy::default(),
            progress_report_interval: default_progress_report_interval(),
        }
    }
}

impl PlaybackConfig {
    pub fn with_end_of_queue(mut self, policy: EndOfQueuePolicy) -> Self {
        self.end_of_queue = policy;
        self
    }

    pub fn with_progress_report_interval(mut self, interval: Duration) -> Self {
        self.progress_report_interval = interval;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.progress_report_interval < Duration::from_secs(1) {
            return Err(PlaybackError::InvalidConfig(
                "progress_report_interval must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_progress_report_interval() -> Duration {
    Duration::from_secs(10)
}

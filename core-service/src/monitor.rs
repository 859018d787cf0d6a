//! Progress monitor: turns session snapshots into progress reports.

use core_playback::{PlaybackStatus, ProgressReporter, SessionSnapshot};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One report the monitor decided to send.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProgressReport {
    pub track_id: String,
    pub position_seconds: f64,
    pub is_paused: bool,
}

/// Decides which snapshots are worth reporting.
///
/// A report is due when the track changes, when playback pauses or resumes,
/// or when the position moved by at least `interval` since the last report.
/// Only playing and paused sessions are reported.
pub(crate) struct ProgressTracker {
    interval_seconds: f64,
    last: Option<ProgressReport>,
}

impl ProgressTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_seconds: interval.as_secs_f64(),
            last: None,
        }
    }

    pub fn observe(&mut self, snapshot: &SessionSnapshot) -> Option<ProgressReport> {
        let is_paused = match snapshot.status {
            PlaybackStatus::Playing => false,
            PlaybackStatus::Paused => true,
            _ => return None,
        };
        let track_id = snapshot.current_track_id()?;
        let position_seconds = snapshot.position_seconds;

        let due = match &self.last {
            None => true,
            Some(last) => {
                last.track_id != track_id
                    || last.is_paused != is_paused
                    || (position_seconds - last.position_seconds).abs() >= self.interval_seconds
            }
        };
        if !due {
            return None;
        }

        let report = ProgressReport {
            track_id: track_id.to_string(),
            position_seconds,
            is_paused,
        };
        self.last = Some(report.clone());
        Some(report)
    }
}

/// Watches `snapshots` until the session goes away and sends due reports.
pub(crate) fn spawn_progress_monitor(
    mut snapshots: watch::Receiver<SessionSnapshot>,
    reporter: ProgressReporter,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tracker = ProgressTracker::new(interval);
        while snapshots.changed().await.is_ok() {
            let due = tracker.observe(&snapshots.borrow_and_update());
            let Some(report) = due else {
                continue;
            };

            if let Err(e) = reporter
                .send_progress(&report.track_id, report.position_seconds, report.is_paused)
                .await
            {
                warn!(track_id = %report.track_id, error = %e, "Failed to report playback progress");
            }
        }
        debug!("Session closed, progress monitor stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::{AlbumRef, ArtistRef, Track};

    fn track(id: &str) -> Track {
        let artist = ArtistRef {
            id: "ar".to_string(),
            name: "Artist".to_string(),
            artwork_url: String::new(),
        };
        Track {
            id: id.to_string(),
            title: id.to_string(),
            artist: artist.clone(),
            album: AlbumRef {
                id: "al".to_string(),
                title: "Album".to_string(),
                artist,
                release_date: String::new(),
                artwork_url: String::new(),
            },
            duration_seconds: 300,
            stream_url: String::new(),
            artwork_url: String::new(),
        }
    }

    fn snapshot(id: &str, status: PlaybackStatus, position_seconds: f64) -> SessionSnapshot {
        SessionSnapshot {
            current_track: Some(track(id)),
            queue: vec![track(id)],
            status,
            position_seconds,
            duration_seconds: 300.0,
            ..SessionSnapshot::default()
        }
    }

    #[test]
    fn test_reports_on_interval_pause_and_track_change() {
        let mut tracker = ProgressTracker::new(Duration::from_secs(10));

        let first = tracker.observe(&snapshot("a", PlaybackStatus::Playing, 0.0));
        assert_eq!(
            first,
            Some(ProgressReport {
                track_id: "a".to_string(),
                position_seconds: 0.0,
                is_paused: false,
            })
        );

        assert!(tracker.observe(&snapshot("a", PlaybackStatus::Playing, 4.0)).is_none());
        assert!(tracker.observe(&snapshot("a", PlaybackStatus::Playing, 9.5)).is_none());
        assert!(tracker.observe(&snapshot("a", PlaybackStatus::Playing, 10.0)).is_some());

        let paused = tracker
            .observe(&snapshot("a", PlaybackStatus::Paused, 11.0))
            .unwrap();
        assert!(paused.is_paused);

        let next = tracker
            .observe(&snapshot("b", PlaybackStatus::Playing, 0.0))
            .unwrap();
        assert_eq!(next.track_id, "b");
    }

    #[test]
    fn test_backward_seek_counts_as_movement() {
        let mut tracker = ProgressTracker::new(Duration::from_secs(10));
        tracker.observe(&snapshot("a", PlaybackStatus::Playing, 120.0));

        assert!(tracker.observe(&snapshot("a", PlaybackStatus::Playing, 30.0)).is_some());
    }

    #[test]
    fn test_ignores_loading_idle_and_error() {
        let mut tracker = ProgressTracker::new(Duration::from_secs(10));

        assert!(tracker.observe(&snapshot("a", PlaybackStatus::Loading, 0.0)).is_none());
        assert!(tracker.observe(&snapshot("a", PlaybackStatus::Error, 0.0)).is_none());
        assert!(tracker.observe(&SessionSnapshot::default()).is_none());
    }
}

//! # Playback Session
//!
//! The single owner of [`SessionState`]. Commands from presenters and
//! notifications from the engine both go through [`PlaybackSession`], which
//! drives the [`PlaybackEngine`], publishes a [`SessionSnapshot`] on a
//! `watch` channel after every change and mirrors transitions onto the
//! [`EventBus`] as [`PlaybackEvent`]s.
//!
//! ## State machine
//!
//! ```text
//! Idle ──load──▶ Loading ──engine playing──▶ Playing ◀──▶ Paused
//!   ▲               │                            │           │
//!   │               └──────── any failure ───────┴───────────┴──▶ Error
//!   └──────────────────── clear_error / reset ◀───────────────────┘
//! ```
//!
//! ## Superseded commands
//!
//! Every track-changing command takes a new generation before it awaits the
//! engine. Completions carry the generation they started with and are
//! dropped when a newer command has started since, so a slow load for an
//! older selection can never overwrite the state of the newer one.
//!
//! The state mutex is never held across an `.await`.

use crate::config::{EndOfQueuePolicy, PlaybackConfig};
use crate::error::{PlaybackError, Result};
use crate::state::{PlaybackStatus, SessionSnapshot, SessionState};
use crate::traits::{EngineEvent, EngineState, EngineTrack, PlaybackEngine};
use core_library::Track;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_runtime::logging::redact_url_credentials;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

/// Playback session driving one engine.
pub struct PlaybackSession {
    engine: Arc<dyn PlaybackEngine>,
    config: PlaybackConfig,
    state: Mutex<SessionState>,
    snapshots: watch::Sender<SessionSnapshot>,
    event_bus: Option<EventBus>,
}

impl PlaybackSession {
    pub fn new(engine: Arc<dyn PlaybackEngine>, config: PlaybackConfig) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self {
            engine,
            config,
            state: Mutex::new(SessionState::default()),
            snapshots,
            event_bus: None,
        }
    }

    /// Publishes playback transitions on `event_bus`.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<dyn PlaybackEngine> {
        &self.engine
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Plays a single track, replacing the queue with `[track]`.
    ///
    /// # Errors
    ///
    /// Returns the engine failure after recording it as
    /// `Error playing {title}: {reason}`.
    #[instrument(skip(self, track), fields(track_id = %track.id))]
    pub async fn set_current_track(&self, track: Track) -> Result<()> {
        let title = track.title.clone();
        let engine_tracks = vec![EngineTrack::from(&track)];
        debug!(stream_url = %redact_url_credentials(&track.stream_url), "Loading track");

        let generation = self.update(|state, events| {
            events.push(PlaybackEvent::QueueReplaced {
                length: 1,
                first_track_id: Some(track.id.clone()),
            });
            state.queue = vec![track.clone()];
            state.load_track(track);
            state.next_generation()
        });

        let result = self.load_and_play(generation, engine_tracks).await;
        self.complete(generation, result, |reason| {
            format!("Error playing {}: {}", title, reason)
        })
    }

    /// Replaces the queue and starts playing its first entry.
    ///
    /// An empty `tracks` leaves the session untouched.
    #[instrument(skip(self, tracks), fields(length = tracks.len()))]
    pub async fn set_queue(&self, tracks: Vec<Track>) -> Result<()> {
        let Some(first) = tracks.first().cloned() else {
            debug!("Ignoring empty queue");
            return Ok(());
        };
        let engine_tracks = tracks.iter().map(EngineTrack::from).collect();

        let generation = self.update(|state, events| {
            events.push(PlaybackEvent::QueueReplaced {
                length: tracks.len(),
                first_track_id: Some(first.id.clone()),
            });
            state.queue = tracks;
            state.load_track(first);
            state.next_generation()
        });

        let result = self.load_and_play(generation, engine_tracks).await;
        self.complete(generation, result, |reason| {
            format!("Error setting queue: {}", reason)
        })
    }

    /// Resumes playback. Ignored while a track is loading.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::NoTrackLoaded`] when there is nothing to play
    /// - engine failures, recorded as `Error playing: {reason}`
    #[instrument(skip(self))]
    pub async fn play(&self) -> Result<()> {
        let Some(generation) = self.ready_generation()? else {
            return Ok(());
        };

        let result = self.engine.play().await;
        self.complete(generation, result, |reason| format!("Error playing: {}", reason))
    }

    /// Pauses playback. Same guards as [`play`](Self::play).
    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<()> {
        let Some(generation) = self.ready_generation()? else {
            return Ok(());
        };

        let result = self.engine.pause().await;
        self.complete(generation, result, |reason| format!("Error pausing: {}", reason))
    }

    /// Moves to the next queue entry, wrapping from the last to the first.
    #[instrument(skip(self))]
    pub async fn skip_next(&self) -> Result<()> {
        self.skip_with(|current, len| match current {
            Some(index) => (index + 1) % len,
            None => 0,
        })
        .await
    }

    /// Moves to the previous queue entry, wrapping from the first to the last.
    #[instrument(skip(self))]
    pub async fn skip_previous(&self) -> Result<()> {
        self.skip_with(|current, len| match current {
            Some(index) => (index + len - 1) % len,
            None => len - 1,
        })
        .await
    }

    /// Seeks within the current track. Ignored while a track is loading.
    ///
    /// Negative targets clamp to 0, and targets past a known duration clamp
    /// to the duration.
    #[instrument(skip(self))]
    pub async fn seek_to(&self, position_seconds: f64) -> Result<()> {
        let (generation, target) = {
            let state = self.state.lock();
            if state.status == PlaybackStatus::Loading {
                debug!("Ignoring seek while loading");
                return Ok(());
            }
            if state.current_track.is_none() {
                return Err(PlaybackError::NoTrackLoaded);
            }

            let mut target = position_seconds.max(0.0);
            if state.duration_seconds > 0.0 {
                target = target.min(state.duration_seconds);
            }
            (state.generation, target)
        };

        let result = self.engine.seek(target).await;
        if result.is_ok() {
            self.update(|state, _| {
                if state.generation == generation && !state.is_scrubbing {
                    state.position_seconds = target;
                }
            });
        }
        self.complete(generation, result, |reason| format!("Error seeking: {}", reason))
    }

    /// While scrubbing, engine position updates do not move the position.
    pub fn set_scrubbing(&self, scrubbing: bool) {
        self.update(|state, _| state.is_scrubbing = scrubbing);
    }

    /// Forgets the last error; an `Error` status falls back to `Idle`.
    pub fn clear_error(&self) {
        self.update(|state, _| {
            state.last_error = None;
            if state.status == PlaybackStatus::Error {
                state.status = PlaybackStatus::Idle;
            }
        });
    }

    /// Stops the engine and returns to an idle session with an empty queue.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<()> {
        self.update(|state, _| {
            let generation = state.next_generation();
            *state = SessionState {
                generation,
                ..SessionState::default()
            };
        });

        self.engine.reset().await.inspect_err(|e| {
            warn!(error = %e, "Engine reset failed");
        })
    }

    // ========================================================================
    // Engine notifications
    // ========================================================================

    /// Applies one engine notification to the session.
    pub async fn handle_engine_event(&self, event: EngineEvent) {
        trace!(?event, "Engine event");
        match event {
            EngineEvent::StateChanged(engine_state) => self.on_state_changed(engine_state),
            EngineEvent::PositionUpdated {
                position_seconds,
                duration_seconds,
            } => self.on_position_updated(position_seconds, duration_seconds),
            EngineEvent::TrackChanged { track_id } => self.on_track_changed(&track_id),
            EngineEvent::PlaybackFailed { message } => self.on_playback_failed(&message),
            EngineEvent::QueueEnded => self.on_queue_ended().await,
        }
    }

    fn on_state_changed(&self, engine_state: EngineState) {
        let status = match engine_state {
            EngineState::Buffering | EngineState::Connecting => PlaybackStatus::Loading,
            EngineState::Playing => PlaybackStatus::Playing,
            EngineState::Ready | EngineState::Paused | EngineState::Stopped => {
                PlaybackStatus::Paused
            }
        };

        self.update(|state, _| {
            if state.current_track.is_none() {
                trace!(?engine_state, "No current track, ignoring engine state");
                return;
            }
            // `last_error` is left alone; only clear_error or a new track drops it.
            state.status = status;
        });
    }

    fn on_position_updated(&self, position_seconds: f64, duration_seconds: f64) {
        self.update(|state, _| {
            if state.is_scrubbing || state.current_track.is_none() {
                return;
            }
            state.position_seconds = position_seconds.max(0.0);
            if duration_seconds > 0.0 {
                state.duration_seconds = duration_seconds;
            }
        });
    }

    fn on_track_changed(&self, track_id: &str) {
        self.update(|state, _| {
            if state.current_track_id().as_deref() == Some(track_id) {
                return;
            }
            match state.queue.iter().find(|track| track.id == track_id).cloned() {
                Some(track) => {
                    debug!(track_id, "Engine advanced to another track");
                    state.position_seconds = 0.0;
                    state.duration_seconds = track.duration_seconds as f64;
                    state.current_track = Some(track);
                }
                None => warn!(track_id, "Engine reported a track outside the queue"),
            }
        });
    }

    fn on_playback_failed(&self, message: &str) {
        let message = format!("Playback error: {}", message);
        warn!(error = %message, "Engine reported a playback failure");

        self.update(|state, events| {
            state.status = PlaybackStatus::Error;
            state.last_error = Some(message.clone());
            events.push(PlaybackEvent::Error {
                track_id: state.current_track_id(),
                message,
            });
        });
    }

    async fn on_queue_ended(&self) {
        self.update(|state, events| {
            events.push(PlaybackEvent::QueueEnded {
                last_track_id: state.current_track_id(),
            });
        });
        info!(policy = ?self.config.end_of_queue, "Queue ended");

        match self.config.end_of_queue {
            EndOfQueuePolicy::Hold => self.update(|state, _| {
                if state.current_track.is_some() && state.status != PlaybackStatus::Error {
                    state.status = PlaybackStatus::Paused;
                    state.position_seconds = state.duration_seconds;
                }
            }),
            EndOfQueuePolicy::RepeatAll => {
                // Failures are already recorded in the session state.
                let _ = self.skip_with(|_, _| 0).await;
            }
            EndOfQueuePolicy::Clear => {
                let _ = self.reset().await;
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Generation for a play/pause command, `None` while loading.
    fn ready_generation(&self) -> Result<Option<u64>> {
        let state = self.state.lock();
        if state.status == PlaybackStatus::Loading {
            debug!("Ignoring command while loading");
            return Ok(None);
        }
        if state.current_track.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        Ok(Some(state.generation))
    }

    /// Moves to the queue index chosen by `pick(current_index, queue_len)`
    /// and starts it. No-op on an empty queue.
    async fn skip_with(&self, pick: impl FnOnce(Option<usize>, usize) -> usize) -> Result<()> {
        let target = self.update(|state, _| {
            let len = state.queue.len();
            if len == 0 {
                return None;
            }
            let index = pick(state.current_index(), len);
            let track = state.queue.get(index)?.clone();
            let title = track.title.clone();
            state.load_track(track);
            Some((index, title, state.next_generation()))
        });

        let Some((index, title, generation)) = target else {
            debug!("Queue is empty, nothing to skip to");
            return Ok(());
        };

        let result = self.skip_and_play(generation, index).await;
        self.complete(generation, result, |reason| {
            format!("Error playing {}: {}", title, reason)
        })
    }

    async fn load_and_play(&self, generation: u64, tracks: Vec<EngineTrack>) -> Result<()> {
        self.engine.reset().await?;
        if !self.is_current(generation) {
            return Ok(());
        }
        self.engine.load(tracks).await?;
        if !self.is_current(generation) {
            return Ok(());
        }
        self.engine.play().await
    }

    async fn skip_and_play(&self, generation: u64, index: usize) -> Result<()> {
        self.engine.skip_to(index).await?;
        if !self.is_current(generation) {
            return Ok(());
        }
        self.engine.play().await
    }

    fn is_current(&self, generation: u64) -> bool {
        let current = self.state.lock().generation;
        if current != generation {
            debug!(generation, current, "Command superseded");
        }
        current == generation
    }

    /// Records a failed command unless a newer track-changing command
    /// started after it. The error is returned to the caller either way.
    fn complete(
        &self,
        generation: u64,
        result: Result<()>,
        message: impl FnOnce(&str) -> String,
    ) -> Result<()> {
        let Err(error) = result else {
            return Ok(());
        };
        let reason = error.reason();

        self.update(|state, events| {
            if state.generation != generation {
                debug!(
                    generation,
                    current = state.generation,
                    error = %reason,
                    "Dropping failure of superseded command"
                );
                return;
            }

            let message = message(&reason);
            warn!(error = %message, "Playback command failed");
            state.status = PlaybackStatus::Error;
            state.last_error = Some(message.clone());
            events.push(PlaybackEvent::Error {
                track_id: state.current_track_id(),
                message,
            });
        });

        Err(error)
    }

    /// Runs `apply` under the state lock, then publishes the snapshot and the
    /// resulting events. Track and status changes are detected here; `apply`
    /// only pushes the events that cannot be derived from the state.
    fn update<R>(&self, apply: impl FnOnce(&mut SessionState, &mut Vec<PlaybackEvent>) -> R) -> R {
        let mut events = Vec::new();
        let mut state = self.state.lock();

        let previous_track = state.current_track_id();
        let previous_status = state.status;

        let result = apply(&mut *state, &mut events);

        if state.current_track_id() != previous_track {
            if let Some(track) = &state.current_track {
                events.push(PlaybackEvent::TrackChanged {
                    track_id: track.id.clone(),
                    title: track.title.clone(),
                });
            }
        }
        if state.status != previous_status {
            events.push(PlaybackEvent::StatusChanged {
                track_id: state.current_track_id(),
                status: state.status.to_string(),
            });
        }

        let snapshot = state.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });

        if let Some(bus) = &self.event_bus {
            for event in events {
                let _ = bus.emit(CoreEvent::Playback(event));
            }
        }

        result
    }
}

/// Feeds engine notifications into `session` until the sender side closes.
pub fn spawn_event_dispatcher(
    session: Arc<PlaybackSession>,
    mut events: mpsc::UnboundedReceiver<EngineEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            session.handle_engine_event(event).await;
        }
        debug!("Engine event channel closed");
    })
}

//! # Playback Module
//!
//! Playback session state machine, the engine seam it drives and progress
//! reporting to the catalog service.
//!
//! ## Overview
//!
//! - [`PlaybackEngine`] is implemented by the host's audio player; its
//!   notifications arrive as [`EngineEvent`]s
//! - [`PlaybackSession`] owns queue, current track, status and position, and
//!   is the only place they change
//! - [`ProgressReporter`] posts position updates for the signed-in user
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_playback::{spawn_event_dispatcher, PlaybackConfig, PlaybackSession};
//!
//! let session = Arc::new(PlaybackSession::new(engine, PlaybackConfig::default()));
//! let dispatcher = spawn_event_dispatcher(session.clone(), engine_events);
//!
//! session.set_queue(tracks).await?;
//! let mut snapshots = session.subscribe();
//! while snapshots.changed().await.is_ok() {
//!     render(&snapshots.borrow());
//! }
//! ```

pub mod config;
pub mod error;
pub mod progress;
pub mod session;
pub mod state;
pub mod traits;

pub use config::{EndOfQueuePolicy, PlaybackConfig};
pub use error::{PlaybackError, Result};
pub use progress::ProgressReporter;
pub use session::{spawn_event_dispatcher, PlaybackSession};
pub use state::{PlaybackStatus, SessionSnapshot, SessionState};
pub use traits::{EngineEvent, EngineState, EngineTrack, PlaybackEngine};

//! Core service façade and bootstrap helpers.
//!
//! [`CoreService`] wires the host-provided pieces (HTTP client, playback
//! engine and its notification channel) into the shared core: the event
//! bus, the catalog sign-in, the playback session with its engine-event
//! dispatcher, and the progress monitor that keeps the catalog informed.
//!
//! Desktop apps typically enable the `desktop-shims` feature, which supplies
//! a `reqwest`-based HTTP client when none is injected.
//!
//! ```ignore
//! use core_service::{CoreConfig, CoreService};
//!
//! let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
//! let engine = Arc::new(HostEngine::new(events_tx));
//!
//! let core = CoreService::start(CoreConfig::builder().build()?, engine, events_rx)?;
//! core.auth().login("https://media.example.com", "alice", "secret").await?;
//!
//! let tracks = core.map_tracks(&items).await;
//! core.session().set_queue(tracks).await?;
//! ```

pub mod error;
mod monitor;

pub use error::{CoreError, Result};

pub use core_auth::{AuthManager, Credentials};
pub use core_library::{map_to_track, CatalogItem, Track};
pub use core_playback::{
    EngineEvent, EngineState, EngineTrack, PlaybackConfig, PlaybackEngine, PlaybackSession,
    PlaybackStatus, SessionSnapshot,
};
pub use core_runtime::config::{ClientInfo, CoreConfig};
pub use core_runtime::events::{AuthEvent, CoreEvent, EventBus, EventStream, PlaybackEvent};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::ReqwestHttpClient;

use core_library::mapper::{map_to_track_with, StreamProfile};
use core_playback::{spawn_event_dispatcher, ProgressReporter};
use monitor::spawn_progress_monitor;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Primary façade exposed to host applications.
pub struct CoreService {
    config: CoreConfig,
    event_bus: EventBus,
    auth: Arc<AuthManager>,
    session: Arc<PlaybackSession>,
    stream_profile: StreamProfile,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    engine: EngineGuard,
}

impl CoreService {
    /// Starts the core with the default [`PlaybackConfig`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: CoreConfig,
        engine: Arc<dyn PlaybackEngine>,
        engine_events: UnboundedReceiver<EngineEvent>,
    ) -> Result<Self> {
        Self::start_with(config, PlaybackConfig::default(), engine, engine_events)
    }

    /// Starts the core and its background tasks.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Runtime`] / [`CoreError::Playback`] when a configuration
    ///   fails validation
    /// - [`CoreError::InitializationFailed`] outside a tokio runtime
    #[instrument(skip_all, fields(device_id = %config.client_info.device_id))]
    pub fn start_with(
        config: CoreConfig,
        playback_config: PlaybackConfig,
        engine: Arc<dyn PlaybackEngine>,
        engine_events: UnboundedReceiver<EngineEvent>,
    ) -> Result<Self> {
        config.validate()?;
        playback_config.validate()?;
        if Handle::try_current().is_err() {
            return Err(CoreError::InitializationFailed(
                "CoreService must be started from within a tokio runtime".to_string(),
            ));
        }

        let event_bus = EventBus::new(config.event_buffer_size);
        let auth = Arc::new(AuthManager::new(
            config.http_client.clone(),
            config.client_info.clone(),
            event_bus.clone(),
        ));

        let interval = playback_config.progress_report_interval;
        let session = Arc::new(
            PlaybackSession::new(engine.clone(), playback_config).with_event_bus(event_bus.clone()),
        );
        let reporter = ProgressReporter::new(config.http_client.clone(), auth.clone());

        let tasks = vec![
            spawn_event_dispatcher(session.clone(), engine_events),
            spawn_progress_monitor(session.subscribe(), reporter, interval),
        ];

        info!("Core service started");
        Ok(Self {
            config,
            event_bus,
            auth,
            session,
            stream_profile: StreamProfile::default(),
            tasks: Mutex::new(tasks),
            engine: EngineGuard::new(engine),
        })
    }

    /// Uses `profile` for stream URLs built by [`map_track`](Self::map_track).
    pub fn with_stream_profile(mut self, profile: StreamProfile) -> Self {
        self.stream_profile = profile;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn auth(&self) -> &Arc<AuthManager> {
        &self.auth
    }

    pub fn session(&self) -> &Arc<PlaybackSession> {
        &self.session
    }

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    /// Subscribes to auth and playback events.
    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    /// Maps a catalog record against the signed-in server.
    ///
    /// Signed out, the stream and artwork URLs are empty.
    pub async fn map_track(&self, item: &CatalogItem) -> Track {
        let credentials = self.auth.credentials().await;
        let (base_url, token) = credentials
            .as_ref()
            .map(|c| (c.server_url.as_str(), c.access_token.as_str()))
            .unwrap_or_default();
        map_to_track_with(item, base_url, token, &self.stream_profile)
    }

    pub async fn map_tracks(&self, items: &[CatalogItem]) -> Vec<Track> {
        let credentials = self.auth.credentials().await;
        let (base_url, token) = credentials
            .as_ref()
            .map(|c| (c.server_url.as_str(), c.access_token.as_str()))
            .unwrap_or_default();
        items
            .iter()
            .map(|item| map_to_track_with(item, base_url, token, &self.stream_profile))
            .collect()
    }

    /// Stops background tasks and releases the engine.
    ///
    /// Safe to call more than once; the engine is released only the first time.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<()> {
        self.abort_tasks();
        self.engine.release().await?;
        info!("Core service stopped");
        Ok(())
    }

    fn abort_tasks(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task.abort();
        }
    }
}

impl Drop for CoreService {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// Releases the engine exactly once, on shutdown or on drop.
struct EngineGuard {
    engine: Arc<dyn PlaybackEngine>,
    released: AtomicBool,
}

impl EngineGuard {
    fn new(engine: Arc<dyn PlaybackEngine>) -> Self {
        Self {
            engine,
            released: AtomicBool::new(false),
        }
    }

    async fn release(&self) -> core_playback::Result<()> {
        if self.released.swap(true, Ordering::SeqCst) {
            debug!("Engine already released");
            return Ok(());
        }
        self.engine.release().await
    }
}

impl Drop for EngineGuard {
    fn drop(&mut self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        let engine = self.engine.clone();
        let release = async move {
            if let Err(e) = engine.release().await {
                warn!(error = %e, "Engine release failed");
            }
        };

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(release);
            }
            Err(_) => match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime.block_on(release),
                Err(e) => warn!(error = %e, "No runtime to release the engine on"),
            },
        }
    }
}

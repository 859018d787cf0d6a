//! # Progress Reporter
//!
//! Tells the catalog service how far the user got in the current track so
//! that resume positions and "now playing" views stay in sync.
//!
//! Reporting is best-effort: it never changes session state, never retries
//! and never surfaces an error to the user.

use crate::error::{PlaybackError, Result};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, RetryPolicy};
use core_auth::headers::{token_authorization, TOKEN_AUTHORIZATION_HEADER};
use core_auth::CredentialsProvider;
use core_library::mapper::TICKS_PER_SECOND;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, warn};

const PROGRESS_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PlaybackProgress<'a> {
    item_id: &'a str,
    user_id: &'a str,
    position_ticks: i64,
    is_paused: bool,
    event_name: &'static str,
}

/// Converts seconds to catalog ticks, rounding to the nearest tick.
pub fn seconds_to_ticks(seconds: f64) -> i64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * TICKS_PER_SECOND as f64).round() as i64
}

/// Posts playback progress for the signed-in user.
#[derive(Clone)]
pub struct ProgressReporter {
    http_client: Arc<dyn HttpClient>,
    credentials: Arc<dyn CredentialsProvider>,
}

impl ProgressReporter {
    pub fn new(http_client: Arc<dyn HttpClient>, credentials: Arc<dyn CredentialsProvider>) -> Self {
        Self {
            http_client,
            credentials,
        }
    }

    /// Fire-and-forget variant of [`send_progress`](Self::send_progress).
    ///
    /// Returns immediately; failures are logged at `warn`. Outside a tokio
    /// runtime the report is dropped.
    pub fn report_progress(&self, track_id: &str, position_seconds: f64, is_paused: bool) {
        let Ok(handle) = Handle::try_current() else {
            warn!(track_id, "No async runtime, dropping progress report");
            return;
        };

        let reporter = self.clone();
        let track_id = track_id.to_string();
        handle.spawn(async move {
            if let Err(e) = reporter
                .send_progress(&track_id, position_seconds, is_paused)
                .await
            {
                warn!(track_id = %track_id, error = %e, "Failed to report playback progress");
            }
        });
    }

    /// Posts one progress report and waits for the response.
    ///
    /// Skipped (returns `Ok`) when nobody is signed in or `track_id` is empty.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::Bridge`] for transport failures and non-2xx statuses.
    pub async fn send_progress(
        &self,
        track_id: &str,
        position_seconds: f64,
        is_paused: bool,
    ) -> Result<()> {
        if track_id.is_empty() {
            return Ok(());
        }
        let Some(credentials) = self.credentials.credentials().await else {
            debug!(track_id, "Not signed in, skipping progress report");
            return Ok(());
        };

        let payload = PlaybackProgress {
            item_id: track_id,
            user_id: &credentials.user_id,
            position_ticks: seconds_to_ticks(position_seconds),
            is_paused,
            event_name: if is_paused { "pause" } else { "timeupdate" },
        };

        let request = HttpRequest::new(
            HttpMethod::Post,
            format!("{}/Sessions/Playing/Progress", credentials.server_url),
        )
        .header(
            TOKEN_AUTHORIZATION_HEADER,
            token_authorization(&credentials.access_token),
        )
        .timeout(PROGRESS_REQUEST_TIMEOUT)
        .json(&payload)
        .map_err(|e| PlaybackError::Internal(format!("Cannot encode progress: {}", e)))?;

        self.http_client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await?
            .error_for_status()?;

        debug!(
            track_id,
            position_ticks = payload.position_ticks,
            is_paused,
            "Reported playback progress"
        );
        Ok(())
    }
}

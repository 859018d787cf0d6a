//! Progress reporting against a mocked catalog service

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_auth::{Credentials, StaticCredentials};
use core_playback::{
    EngineEvent, EngineState, EngineTrack, PlaybackConfig, PlaybackEngine, PlaybackError,
    PlaybackSession, PlaybackStatus, ProgressReporter,
};
use core_library::{AlbumRef, ArtistRef, Track};
use mockall::mock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

mock! {
    HttpClient {}

    #[async_trait]
    impl HttpClient for HttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

fn response(status: u16) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: Bytes::new(),
    }
}

fn credentials() -> Credentials {
    Credentials {
        server_url: "https://media.example.com".to_string(),
        username: "alice".to_string(),
        user_id: "user-1".to_string(),
        access_token: "tok-1".to_string(),
        device_id: "sonora-app-test".to_string(),
    }
}

fn reporter(http: MockHttpClient, signed_in: bool) -> ProgressReporter {
    let credentials = StaticCredentials::new(signed_in.then(credentials));
    ProgressReporter::new(Arc::new(http), Arc::new(credentials))
}

fn body(request: &HttpRequest) -> serde_json::Value {
    serde_json::from_slice(request.body.as_ref().unwrap()).unwrap()
}

#[tokio::test]
async fn test_send_progress_request_shape() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(|request| {
            request.method == HttpMethod::Post
                && request.url == "https://media.example.com/Sessions/Playing/Progress"
                && request.headers.get("Authorization").map(String::as_str)
                    == Some(r#"MediaBrowser Token="tok-1""#)
                && body(request)
                    == serde_json::json!({
                        "ItemId": "t-1",
                        "UserId": "user-1",
                        "PositionTicks": 125_000_000i64,
                        "IsPaused": false,
                        "EventName": "timeupdate"
                    })
        })
        .times(1)
        .returning(|_| Ok(response(204)));

    reporter(http, true)
        .send_progress("t-1", 12.5, false)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_paused_report_uses_pause_event() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .withf(|request| {
            let body = body(request);
            body["EventName"] == "pause" && body["IsPaused"] == true
        })
        .times(1)
        .returning(|_| Ok(response(200)));

    reporter(http, true)
        .send_progress("t-1", 0.0, true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_skipped_without_credentials_or_track() {
    let mut http = MockHttpClient::new();
    http.expect_execute().times(0);
    let signed_out = reporter(http, false);
    signed_out.send_progress("t-1", 3.0, false).await.unwrap();

    let mut http = MockHttpClient::new();
    http.expect_execute().times(0);
    let signed_in = reporter(http, true);
    signed_in.send_progress("", 3.0, false).await.unwrap();
}

#[tokio::test]
async fn test_send_progress_surfaces_http_status() {
    let mut http = MockHttpClient::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(response(500)));

    let result = reporter(http, true).send_progress("t-1", 1.0, false).await;

    assert!(matches!(
        result,
        Err(PlaybackError::Bridge(BridgeError::HttpStatus { status: 500, .. }))
    ));
}

// ============================================================================
// Failures never reach the session
// ============================================================================

struct IdleEngine;

#[async_trait]
impl PlaybackEngine for IdleEngine {
    async fn reset(&self) -> core_playback::Result<()> {
        Ok(())
    }
    async fn load(&self, _tracks: Vec<EngineTrack>) -> core_playback::Result<()> {
        Ok(())
    }
    async fn play(&self) -> core_playback::Result<()> {
        Ok(())
    }
    async fn pause(&self) -> core_playback::Result<()> {
        Ok(())
    }
    async fn seek(&self, _position_seconds: f64) -> core_playback::Result<()> {
        Ok(())
    }
    async fn skip_to(&self, _index: usize) -> core_playback::Result<()> {
        Ok(())
    }
    async fn release(&self) -> core_playback::Result<()> {
        Ok(())
    }
}

fn track() -> Track {
    let artist = ArtistRef {
        id: "ar-1".to_string(),
        name: "Artist".to_string(),
        artwork_url: String::new(),
    };
    Track {
        id: "t-1".to_string(),
        title: "Song".to_string(),
        artist: artist.clone(),
        album: AlbumRef {
            id: "al-1".to_string(),
            title: "Album".to_string(),
            artist,
            release_date: String::new(),
            artwork_url: String::new(),
        },
        duration_seconds: 200,
        stream_url: String::new(),
        artwork_url: String::new(),
    }
}

#[tokio::test]
async fn test_report_failures_leave_session_untouched() {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let mut http = MockHttpClient::new();
    http.expect_execute().times(2).returning(move |_| {
        let _ = done_tx.send(());
        Err(BridgeError::OperationFailed("network unreachable".to_string()))
    });
    let reporter = reporter(http, true);

    let session = PlaybackSession::new(Arc::new(IdleEngine), PlaybackConfig::default());
    session.set_current_track(track()).await.unwrap();
    session
        .handle_engine_event(EngineEvent::StateChanged(EngineState::Playing))
        .await;
    let before = session.snapshot();

    reporter.report_progress("t-1", 10.0, false);
    assert!(reporter.send_progress("t-1", 20.0, false).await.is_err());

    for _ in 0..2 {
        tokio::time::timeout(Duration::from_secs(1), done_rx.recv())
            .await
            .unwrap()
            .unwrap();
    }

    let after = session.snapshot();
    assert_eq!(after, before);
    assert_eq!(after.status, PlaybackStatus::Playing);
    assert!(after.last_error.is_none());
}

//! Integration tests for the logging helpers

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::logger::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{
    init_logging, redact_if_sensitive, redact_url_credentials, LogFormat, LoggingConfig,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for CollectingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

// Only one global subscriber can exist per process, so initialization is
// exercised by a single test.
#[test]
fn test_init_logging_once() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Info)
        .with_logger_sink(sink.clone());

    init_logging(config).expect("first initialization succeeds");

    tracing::info!(
        target: "core_playback",
        url = "https://m.example.com/Audio/1/universal?api_key=abc",
        "Loading stream"
    );
    tracing::debug!(target: "core_playback", "filtered out at info");

    std::thread::spawn(|| {
        tracing::info!(target: "core_service", "Core service stopped");
    })
    .join()
    .unwrap();

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].fields.get("url").map(String::as_str),
            Some("https://m.example.com/Audio/1/universal?api_key=[REDACTED]")
        );
        assert_eq!(entries[1].message, "Core service stopped");
    }

    let again = init_logging(LoggingConfig::default());
    assert!(matches!(again, Err(core_runtime::Error::Logging(_))));
}

#[test]
fn test_pii_redaction_tokens() {
    assert_eq!(redact_if_sensitive("access_token", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("AccessToken", "abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Pw", "hunter2"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("api_key", "k"), "[REDACTED]");
}

#[test]
fn test_pii_redaction_normal_values() {
    assert_eq!(redact_if_sensitive("track_id", "12345"), "12345");
    assert_eq!(redact_if_sensitive("title", "So What"), "So What");
    assert_eq!(redact_if_sensitive("user_id", "user_123"), "user_123");
}

#[test]
fn test_stream_url_redaction() {
    let url = "https://m.example.com/Audio/abc/universal?audioCodec=mp3&maxStreamingBitrate=192000&api_key=tok";
    let redacted = redact_url_credentials(url);
    assert!(redacted.ends_with("api_key=[REDACTED]"));
    assert!(!redacted.contains("tok"));
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}

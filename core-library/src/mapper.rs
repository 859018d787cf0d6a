//! # Track Mapper
//!
//! Turns a raw [`CatalogItem`] into a [`Track`]. Mapping never fails: every
//! missing or empty field resolves to a fixed default, and URL construction is
//! plain string formatting against the catalog base URL.

use crate::models::{AlbumRef, ArtistRef, CatalogItem, Track};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ID: &str = "unknown";

/// Catalog ticks per second (1 tick = 100 ns).
pub const TICKS_PER_SECOND: i64 = 10_000_000;

const ARTWORK_QUERY: &str = "fillHeight=300&fillWidth=300&quality=90";

/// Parameters of the universal streaming endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamProfile {
    /// Codecs the player accepts, in preference order
    pub audio_codecs: Vec<String>,
    /// Bitrate cap in bits per second, omitted from the URL when `None`
    pub max_streaming_bitrate: Option<u32>,
}

impl Default for StreamProfile {
    fn default() -> Self {
        Self {
            audio_codecs: vec!["mp3".to_string()],
            max_streaming_bitrate: Some(192_000),
        }
    }
}

impl StreamProfile {
    pub fn with_codecs<I, S>(mut self, codecs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audio_codecs = codecs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_bitrate(mut self, bitrate: Option<u32>) -> Self {
        self.max_streaming_bitrate = bitrate;
        self
    }

    fn query(&self, credential: &str) -> String {
        let mut query = format!("audioCodec={}", self.audio_codecs.join(","));
        if let Some(bitrate) = self.max_streaming_bitrate {
            query.push_str(&format!("&maxStreamingBitrate={}", bitrate));
        }
        query.push_str(&format!("&api_key={}", credential));
        query
    }
}

/// Map with the default [`StreamProfile`].
pub fn map_to_track(item: &CatalogItem, base_url: &str, credential: &str) -> Track {
    map_to_track_with(item, base_url, credential, &StreamProfile::default())
}

pub fn map_to_track_with(
    item: &CatalogItem,
    base_url: &str,
    credential: &str,
    profile: &StreamProfile,
) -> Track {
    let base = trim_base(base_url);
    let item_id = non_empty(&item.id);

    let first_artist_item = item.artist_items.as_ref().and_then(|items| items.first());
    let linked_artist_id = first_artist_item.and_then(|artist| non_empty(&artist.id));
    let linked_artist_name = first_artist_item.and_then(|artist| non_empty(&artist.name));
    let first_artist_name = item
        .artists
        .as_ref()
        .and_then(|names| names.first())
        .map(String::as_str)
        .filter(|name| !name.is_empty());

    let album_artist_id = non_empty(&item.album_artist_id);
    let album_artist_name = non_empty(&item.album_artist);

    let artist_id = album_artist_id.or(linked_artist_id);
    let artist = ArtistRef {
        id: artist_id.unwrap_or(UNKNOWN_ID).to_string(),
        name: album_artist_name
            .or(linked_artist_name)
            .or(first_artist_name)
            .unwrap_or(UNKNOWN_ARTIST)
            .to_string(),
        artwork_url: artist_id
            .or(item_id)
            .map(|id| artist_artwork_url(base, id))
            .unwrap_or_default(),
    };

    let album_id = non_empty(&item.album_id);
    let album = AlbumRef {
        id: album_id.unwrap_or(UNKNOWN_ID).to_string(),
        title: non_empty(&item.album).unwrap_or(UNKNOWN_ALBUM).to_string(),
        artist: ArtistRef {
            id: album_artist_id.unwrap_or(UNKNOWN_ID).to_string(),
            name: album_artist_name.unwrap_or(UNKNOWN_ARTIST).to_string(),
            artwork_url: String::new(),
        },
        release_date: non_empty(&item.premiere_date).unwrap_or_default().to_string(),
        artwork_url: album_id
            .map(|id| item_artwork_url(base, id))
            .unwrap_or_default(),
    };

    Track {
        id: item_id.unwrap_or_default().to_string(),
        title: non_empty(&item.name).unwrap_or(UNKNOWN_TITLE).to_string(),
        artist,
        album,
        duration_seconds: ticks_to_seconds(item.run_time_ticks),
        stream_url: item_id
            .map(|id| stream_url(base, id, credential, profile))
            .unwrap_or_default(),
        artwork_url: item_id
            .map(|id| item_artwork_url(base, id))
            .unwrap_or_default(),
    }
}

/// Whole seconds for a tick count, 0 for missing or non-positive values.
pub fn ticks_to_seconds(ticks: Option<i64>) -> u64 {
    match ticks {
        Some(ticks) if ticks > 0 => (ticks / TICKS_PER_SECOND) as u64,
        _ => 0,
    }
}

/// `{base}/Audio/{id}/universal?…`, empty when `base_url` is empty.
pub fn stream_url(base_url: &str, item_id: &str, credential: &str, profile: &StreamProfile) -> String {
    let base = trim_base(base_url);
    if base.is_empty() {
        return String::new();
    }
    format!(
        "{}/Audio/{}/universal?{}",
        base,
        item_id,
        profile.query(credential)
    )
}

/// Sized primary image for an item or album, empty when `base_url` is empty.
pub fn item_artwork_url(base_url: &str, item_id: &str) -> String {
    let base = trim_base(base_url);
    if base.is_empty() {
        return String::new();
    }
    format!("{}/Items/{}/Images/Primary?{}", base, item_id, ARTWORK_QUERY)
}

/// Unsized primary image for an artist, empty when `base_url` is empty.
pub fn artist_artwork_url(base_url: &str, artist_id: &str) -> String {
    let base = trim_base(base_url);
    if base.is_empty() {
        return String::new();
    }
    format!("{}/Items/{}/Images/Primary", base, artist_id)
}

fn trim_base(base_url: &str) -> &str {
    base_url.trim().trim_end_matches('/')
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

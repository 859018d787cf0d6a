//! Domain models for catalog content
//!
//! [`CatalogItem`] mirrors the raw record returned by the catalog service;
//! [`Track`] and its references are the normalized values the rest of the
//! core works with.

use serde::{Deserialize, Serialize};

// =============================================================================
// Raw catalog records
// =============================================================================

/// Raw catalog record for an audio item.
///
/// Every field is optional and unknown fields are ignored, so partially
/// populated responses still deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CatalogItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub album: Option<String>,
    pub album_id: Option<String>,
    pub album_artist: Option<String>,
    pub album_artist_id: Option<String>,
    pub artists: Option<Vec<String>>,
    pub artist_items: Option<Vec<ArtistItem>>,
    /// Length in 100-nanosecond ticks
    pub run_time_ticks: Option<i64>,
    pub premiere_date: Option<String>,
}

/// Linked artist object inside a [`CatalogItem`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ArtistItem {
    pub id: Option<String>,
    pub name: Option<String>,
}

// =============================================================================
// Domain Models
// =============================================================================

/// Artist reference embedded in a track or album.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
    pub artwork_url: String,
}

/// Album reference embedded in a track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    pub title: String,
    pub artist: ArtistRef,
    /// Release date as sent by the catalog, empty when unknown
    pub release_date: String,
    pub artwork_url: String,
}

/// A playable item.
///
/// `stream_url` may embed a time-limited credential and can be regenerated
/// without changing `id`; [`Track::same_item`] is the identity comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: ArtistRef,
    pub album: AlbumRef,
    /// Whole seconds, 0 when unknown
    pub duration_seconds: u64,
    pub stream_url: String,
    pub artwork_url: String,
}

impl Track {
    /// Whether both values refer to the same catalog item.
    pub fn same_item(&self, other: &Track) -> bool {
        self.id == other.id
    }
}

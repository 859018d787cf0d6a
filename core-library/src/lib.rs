//! # Library Module
//!
//! Catalog data model and the pure helpers built on it.
//!
//! ## Overview
//!
//! This module provides:
//! - [`CatalogItem`], the raw record returned by the catalog service
//! - [`Track`], [`ArtistRef`] and [`AlbumRef`], the normalized values
//! - the track mapper with its stream and artwork URL builders
//! - `M:SS` time formatting for presenters

pub mod format;
pub mod mapper;
pub mod models;

pub use format::format_time;
pub use mapper::{map_to_track, map_to_track_with, StreamProfile};
pub use models::{AlbumRef, ArtistItem, ArtistRef, CatalogItem, Track};

//! Workspace facade crate.
//!
//! Host applications can depend on `sonora-workspace` instead of wiring each
//! `core-*` crate individually. With `desktop-shims` enabled it re-exports
//! the service façade together with the `reqwest`-backed HTTP client.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;

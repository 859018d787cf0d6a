//! # Authentication Module
//!
//! Username/password sign-in against the media catalog service.
//!
//! ## Overview
//!
//! - [`AuthManager`] performs the sign-in request, holds the resulting
//!   [`Credentials`] in memory and publishes auth events
//! - [`CredentialsProvider`] is the read-only view other crates depend on
//! - [`headers`] formats the `MediaBrowser` authorization header values

pub mod error;
pub mod headers;
pub mod manager;
pub mod provider;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::{normalize_server_url, AuthManager};
pub use provider::{CredentialsProvider, StaticCredentials};
pub use types::{AuthState, Credentials};

//! # Core Configuration Module
//!
//! `CoreConfig` collects the host bridges and settings the core needs before
//! anything is started. Construction goes through [`CoreConfigBuilder`], which
//! fails fast with an actionable error when a required bridge is missing.
//!
//! ## Bridges
//!
//! - `HttpClient` - required for sign-in and progress reporting. With the
//!   `desktop-shims` feature the reqwest-based client from `bridge-desktop` is
//!   injected when none is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{ClientInfo, CoreConfig};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .http_client(Arc::new(MyHttpClient))
//!     .client_info(ClientInfo::default().with_device_name("Living Room Tablet"))
//!     .event_buffer_size(256)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// How this client identifies itself to the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Application name sent as `Client`
    pub name: String,
    /// Human-readable device label sent as `Device`
    pub device_name: String,
    /// Stable per-installation id sent as `DeviceId`
    pub device_id: String,
    /// Application version sent as `Version`
    pub version: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: "Sonora".to_string(),
            device_name: "Sonora Music App".to_string(),
            device_id: generate_device_id(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ClientInfo {
    pub fn with_device_name(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = device_name.into();
        self
    }

    /// Use a device id persisted by the host instead of a freshly generated one.
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("device_name", &self.device_name),
            ("device_id", &self.device_id),
            ("version", &self.version),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("Client {} cannot be empty", field)));
            }
            if value.contains('"') {
                return Err(Error::Config(format!(
                    "Client {} cannot contain double quotes",
                    field
                )));
            }
        }
        Ok(())
    }
}

fn generate_device_id() -> String {
    format!("sonora-app-{}", uuid::Uuid::new_v4().simple())
}

/// Core configuration.
///
/// Use [`CoreConfig::builder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// HTTP client for catalog requests
    pub http_client: Arc<dyn HttpClient>,

    pub client_info: ClientInfo,

    /// Per-subscriber buffer of the event bus
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("client_info", &self.client_info)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Checks the client identity and the event buffer bounds.
    pub fn validate(&self) -> Result<()> {
        self.client_info.validate()?;

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new()
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the media catalog. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Mobile: inject the platform's native HTTP stack."
            .to_string(),
    })
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    client_info: Option<ClientInfo>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the HTTP client implementation.
    ///
    /// Optional when the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn client_info(mut self, client_info: ClientInfo) -> Self {
        self.client_info = Some(client_info);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds and validates the final `CoreConfig`.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when no `HttpClient` is available
    /// - [`Error::Config`] when a value fails validation
    pub fn build(self) -> Result<CoreConfig> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let config = CoreConfig {
            http_client,
            client_info: self.client_info.unwrap_or_default(),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}

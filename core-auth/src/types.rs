use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials for the active catalog session.
///
/// Held in memory only. `Debug` output never includes the access token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Normalized server base URL without a trailing slash
    pub server_url: String,
    pub username: String,
    /// Server-assigned user id
    pub user_id: String,
    pub access_token: String,
    /// Device id that was sent when the token was issued
    pub device_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .field("device_id", &self.device_id)
            .finish()
    }
}

/// Authentication state of an [`AuthManager`](crate::AuthManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthState {
    SignedOut,
    SigningIn,
    SignedIn,
}

/// Body of `POST /Users/AuthenticateByName`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AuthenticateByName<'a> {
    pub username: &'a str,
    pub pw: &'a str,
}

/// The parts of the authentication response the core uses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AuthenticationResult {
    pub access_token: String,
    pub user: AuthenticatedUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AuthenticatedUser {
    pub id: String,
}

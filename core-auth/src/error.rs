use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication against {server_url} failed: {reason}")]
    AuthenticationFailed {
        server_url: String,
        /// HTTP status when the server answered, `None` for transport failures
        status: Option<u16>,
        reason: String,
    },

    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("A sign-in is already in progress")]
    SignInInProgress,

    #[error("Not authenticated")]
    NotAuthenticated,
}

impl AuthError {
    /// Whether retrying the same request may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AuthError::AuthenticationFailed { status, .. } => match status {
                None => true,
                Some(code) => *code >= 500 || *code == 429,
            },
            AuthError::SignInInProgress => true,
            AuthError::InvalidServerUrl { .. } | AuthError::NotAuthenticated => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

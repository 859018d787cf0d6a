//! # Authentication Manager
//!
//! Signs in to the media catalog service with a username and password and
//! keeps the resulting credentials for the rest of the run.
//!
//! ## Overview
//!
//! - `login` normalizes the server URL, posts to
//!   `/Users/AuthenticateByName` and stores the returned token in memory
//! - `logout` discards the credentials
//! - `restore_session` adopts credentials the host persisted earlier
//! - every transition is published on the [`EventBus`] as an [`AuthEvent`]
//!
//! Persisting credentials across launches is the host's job.
//!
//! ## Usage
//!
//! ```ignore
//! use core_auth::AuthManager;
//! use core_runtime::{config::ClientInfo, events::EventBus};
//!
//! let manager = AuthManager::new(http_client, ClientInfo::default(), EventBus::default());
//! let credentials = manager
//!     .login("https://media.example.com/", "alice", "secret")
//!     .await?;
//! assert_eq!(credentials.server_url, "https://media.example.com");
//! ```

use crate::error::{AuthError, Result};
use crate::headers::{client_authorization, CLIENT_AUTHORIZATION_HEADER};
use crate::provider::CredentialsProvider;
use crate::types::{AuthState, AuthenticateByName, AuthenticationResult, Credentials};
use async_trait::async_trait;
use bridge_traits::{
    error::BridgeError,
    http::{HttpClient, HttpMethod, HttpRequest, RetryPolicy},
};
use core_runtime::config::ClientInfo;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Timeout for the sign-in request
const AUTH_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Catalog sign-in orchestrator.
pub struct AuthManager {
    http_client: Arc<dyn HttpClient>,
    client_info: ClientInfo,
    event_bus: EventBus,
    credentials: RwLock<Option<Credentials>>,
    /// Held for the duration of a sign-in request
    sign_in: Mutex<()>,
}

impl AuthManager {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        client_info: ClientInfo,
        event_bus: EventBus,
    ) -> Self {
        Self {
            http_client,
            client_info,
            event_bus,
            credentials: RwLock::new(None),
            sign_in: Mutex::new(()),
        }
    }

    /// Signs in and stores the returned credentials.
    ///
    /// Existing credentials are kept when the attempt fails.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidServerUrl`] when `server_url` is not an http(s) URL
    /// - [`AuthError::SignInInProgress`] when another sign-in has not finished
    /// - [`AuthError::AuthenticationFailed`] for transport failures, rejected
    ///   credentials and unreadable responses
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Credentials> {
        let _sign_in = self.sign_in.try_lock().map_err(|_| {
            warn!("Sign-in already in progress");
            AuthError::SignInInProgress
        })?;

        let server_url = normalize_server_url(server_url).map_err(|e| self.report_failure(e))?;

        info!(server_url = %server_url, "Signing in");
        self.emit(AuthEvent::SigningIn {
            server_url: server_url.clone(),
        });

        let result = self
            .authenticate(&server_url, username, password)
            .await
            .map_err(|e| self.report_failure(e))?;

        let credentials = Credentials {
            server_url: server_url.clone(),
            username: username.to_string(),
            user_id: result.user.id,
            access_token: result.access_token,
            device_id: self.client_info.device_id.clone(),
        };

        *self.credentials.write().await = Some(credentials.clone());

        info!(user_id = %credentials.user_id, "Signed in");
        self.emit(AuthEvent::SignedIn {
            user_id: credentials.user_id.clone(),
            server_url,
        });

        Ok(credentials)
    }

    /// Adopts credentials persisted by the host from an earlier run.
    #[instrument(skip(self, credentials), fields(user_id = %credentials.user_id))]
    pub async fn restore_session(&self, mut credentials: Credentials) -> Result<()> {
        credentials.server_url = normalize_server_url(&credentials.server_url)?;
        if credentials.access_token.is_empty() || credentials.user_id.is_empty() {
            return Err(AuthError::NotAuthenticated);
        }

        let event = AuthEvent::SignedIn {
            user_id: credentials.user_id.clone(),
            server_url: credentials.server_url.clone(),
        };
        *self.credentials.write().await = Some(credentials);

        debug!("Restored session");
        self.emit(event);
        Ok(())
    }

    /// Discards the credentials. Emits `SignedOut` only if there were any.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let previous = self.credentials.write().await.take();
        if let Some(credentials) = previous {
            info!(user_id = %credentials.user_id, "Signed out");
            self.emit(AuthEvent::SignedOut {
                user_id: credentials.user_id,
            });
        }
    }

    pub async fn credentials(&self) -> Option<Credentials> {
        self.credentials.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credentials.read().await.is_some()
    }

    pub async fn state(&self) -> AuthState {
        if self.sign_in.try_lock().is_err() {
            AuthState::SigningIn
        } else if self.is_authenticated().await {
            AuthState::SignedIn
        } else {
            AuthState::SignedOut
        }
    }

    pub fn client_info(&self) -> &ClientInfo {
        &self.client_info
    }

    async fn authenticate(
        &self,
        server_url: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult> {
        let failed = |status: Option<u16>, reason: String| AuthError::AuthenticationFailed {
            server_url: server_url.to_string(),
            status,
            reason,
        };

        let request = HttpRequest::new(
            HttpMethod::Post,
            format!("{}/Users/AuthenticateByName", server_url),
        )
        .header(
            CLIENT_AUTHORIZATION_HEADER,
            client_authorization(&self.client_info),
        )
        .timeout(AUTH_REQUEST_TIMEOUT)
        .json(&AuthenticateByName {
            username,
            pw: password,
        })
        .map_err(|e| failed(None, e.to_string()))?;

        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::no_retry())
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| match e {
                BridgeError::HttpStatus { status, message } => {
                    failed(Some(status), format!("HTTP {}: {}", status, message))
                }
                other => failed(None, other.to_string()),
            })?;

        response
            .json::<AuthenticationResult>()
            .map_err(|e| failed(None, format!("Unexpected response: {}", e)))
    }

    fn report_failure(&self, error: AuthError) -> AuthError {
        warn!(error = %error, "Sign-in failed");
        self.emit(AuthEvent::AuthError {
            message: error.to_string(),
            recoverable: error.is_recoverable(),
        });
        error
    }

    fn emit(&self, event: AuthEvent) {
        let _ = self.event_bus.emit(CoreEvent::Auth(event));
    }
}

#[async_trait]
impl CredentialsProvider for AuthManager {
    async fn credentials(&self) -> Option<Credentials> {
        AuthManager::credentials(self).await
    }
}

/// Trims whitespace and trailing slashes and checks for an http(s) URL.
pub fn normalize_server_url(raw: &str) -> Result<String> {
    let invalid = |reason: &str| AuthError::InvalidServerUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }

    let parsed = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::HttpResponse;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn client_info() -> ClientInfo {
        ClientInfo::default().with_device_id("sonora-app-test")
    }

    fn manager(http: MockHttpClient, bus: &EventBus) -> AuthManager {
        AuthManager::new(Arc::new(http), client_info(), bus.clone())
    }

    const OK_BODY: &str = r#"{"AccessToken":"tok-1","User":{"Id":"user-1","Name":"alice"}}"#;

    #[test]
    fn test_normalize_server_url() {
        assert_eq!(
            normalize_server_url("  https://media.example.com/  ").unwrap(),
            "https://media.example.com"
        );
        assert_eq!(
            normalize_server_url("http://10.0.0.2:8096/jellyfin/").unwrap(),
            "http://10.0.0.2:8096/jellyfin"
        );
        assert!(normalize_server_url("").is_err());
        assert!(normalize_server_url("media.example.com").is_err());
        assert!(normalize_server_url("ftp://media.example.com").is_err());
        assert!(normalize_server_url("https://media.example.com/?x=1").is_err());
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| {
                let body: serde_json::Value =
                    serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
                request.method == HttpMethod::Post
                    && request.url == "https://media.example.com/Users/AuthenticateByName"
                    && request
                        .headers
                        .get(CLIENT_AUTHORIZATION_HEADER)
                        .is_some_and(|h| h.contains(r#"DeviceId="sonora-app-test""#))
                    && body == serde_json::json!({ "Username": "alice", "Pw": "secret" })
            })
            .times(1)
            .returning(|_| Ok(response(200, OK_BODY)));

        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let manager = manager(http, &bus);

        let credentials = manager
            .login("https://media.example.com/", "alice", "secret")
            .await
            .unwrap();

        assert_eq!(credentials.server_url, "https://media.example.com");
        assert_eq!(credentials.user_id, "user-1");
        assert_eq!(credentials.access_token, "tok-1");
        assert_eq!(credentials.device_id, "sonora-app-test");
        assert!(manager.is_authenticated().await);
        assert_eq!(manager.state().await, AuthState::SignedIn);

        assert!(matches!(
            events.try_recv().unwrap(),
            CoreEvent::Auth(AuthEvent::SigningIn { .. })
        ));
        assert_eq!(
            events.try_recv().unwrap(),
            CoreEvent::Auth(AuthEvent::SignedIn {
                user_id: "user-1".to_string(),
                server_url: "https://media.example.com".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_login_rejected_credentials() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(401, "")));

        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let manager = manager(http, &bus);

        let error = manager
            .login("https://media.example.com", "alice", "wrong")
            .await
            .unwrap_err();

        match &error {
            AuthError::AuthenticationFailed { status, .. } => assert_eq!(*status, Some(401)),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!error.is_recoverable());
        assert!(!manager.is_authenticated().await);

        let _signing_in = events.try_recv().unwrap();
        match events.try_recv().unwrap() {
            CoreEvent::Auth(AuthEvent::AuthError { recoverable, .. }) => assert!(!recoverable),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_transport_failure_is_recoverable() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("connection refused".to_string())));

        let bus = EventBus::new(16);
        let manager = manager(http, &bus);

        let error = manager
            .login("https://media.example.com", "alice", "secret")
            .await
            .unwrap_err();
        assert!(error.is_recoverable());
        assert!(error.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_login_malformed_response() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(200, r#"{"User":{}}"#)));

        let bus = EventBus::new(16);
        let manager = manager(http, &bus);

        let result = manager
            .login("https://media.example.com", "alice", "secret")
            .await;
        assert!(matches!(
            result,
            Err(AuthError::AuthenticationFailed { status: None, .. })
        ));
    }

    #[tokio::test]
    async fn test_login_invalid_url_skips_request() {
        let mut http = MockHttpClient::new();
        http.expect_execute().times(0);

        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let manager = manager(http, &bus);

        let result = manager.login("not a url", "alice", "secret").await;
        assert!(matches!(result, Err(AuthError::InvalidServerUrl { .. })));
        assert!(matches!(
            events.try_recv().unwrap(),
            CoreEvent::Auth(AuthEvent::AuthError { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_login_keeps_existing_session() {
        let mut http = MockHttpClient::new();
        let mut calls = 0;
        http.expect_execute().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(response(200, OK_BODY))
            } else {
                Ok(response(500, "boom"))
            }
        });

        let bus = EventBus::new(16);
        let manager = manager(http, &bus);

        manager
            .login("https://media.example.com", "alice", "secret")
            .await
            .unwrap();
        assert!(manager
            .login("https://other.example.com", "bob", "secret")
            .await
            .is_err());

        let credentials = manager.credentials().await.unwrap();
        assert_eq!(credentials.username, "alice");
    }

    #[tokio::test]
    async fn test_logout_emits_signed_out_once() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(response(200, OK_BODY)));

        let bus = EventBus::new(16);
        let manager = manager(http, &bus);
        manager
            .login("https://media.example.com", "alice", "secret")
            .await
            .unwrap();

        let mut events = bus.subscribe();
        manager.logout().await;
        manager.logout().await;

        assert_eq!(
            events.try_recv().unwrap(),
            CoreEvent::Auth(AuthEvent::SignedOut {
                user_id: "user-1".to_string()
            })
        );
        assert!(events.try_recv().is_err());
        assert_eq!(manager.state().await, AuthState::SignedOut);
    }

    #[tokio::test]
    async fn test_restore_session_and_provider() {
        let http = MockHttpClient::new();
        let bus = EventBus::new(16);
        let manager = manager(http, &bus);

        manager
            .restore_session(Credentials {
                server_url: "https://media.example.com/".to_string(),
                username: "alice".to_string(),
                user_id: "user-1".to_string(),
                access_token: "tok".to_string(),
                device_id: "sonora-app-test".to_string(),
            })
            .await
            .unwrap();

        let provider: &dyn CredentialsProvider = &manager;
        let credentials = provider.credentials().await.unwrap();
        assert_eq!(credentials.server_url, "https://media.example.com");
    }

    #[tokio::test]
    async fn test_restore_session_rejects_empty_token() {
        let bus = EventBus::new(16);
        let manager = manager(MockHttpClient::new(), &bus);

        let result = manager
            .restore_session(Credentials {
                server_url: "https://media.example.com".to_string(),
                username: "alice".to_string(),
                user_id: "user-1".to_string(),
                access_token: String::new(),
                device_id: "d".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }
}
